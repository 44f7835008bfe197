use std::collections::HashMap;

use menukit::data::{ItemKind, MenuTree, NodeId};

use super::{Emitter, pool::callback_reference};
use crate::{
    names::{MAIN_MENU_FUNCTION, sanitize, static_symbols},
    utils::{c_string_literal, number_literal},
};

/// Emit one global `menu_item_t` per node.
///
/// Every global is declared before any initializer takes its address:
/// declarations, children arrays, changeable bounds, then initializers,
/// each in preorder.
pub(crate) fn emit_menu(out: &mut Emitter, tree: &MenuTree, root: NodeId) {
    let symbols = static_symbols(tree);
    let order = tree.preorder(root);
    let symbol = |id: &NodeId| symbol_of(&symbols, id);

    out.section("menu items");
    for id in &order {
        out.line(format!("static menu_item_t {};", symbol(id)));
    }
    out.blank();

    let mut any = false;
    for id in &order {
        let children = tree[*id].children();
        if children.is_empty() {
            continue;
        }
        let refs: Vec<String> = children.iter().map(|c| format!("&{}", symbol(c))).collect();
        out.line(format!(
            "static menu_item_t* {}_children[] = {{{}}};",
            symbol(id),
            refs.join(", ")
        ));
        any = true;
    }
    if any {
        out.blank();
    }

    let mut any = false;
    for id in &order {
        let ItemKind::Changeable(c) = &tree[*id].kind else {
            continue;
        };
        let ty = c.data_type();
        for (suffix, value) in [
            ("min_val", c.min_val()),
            ("max_val", c.max_val()),
            ("step_val", c.step_val()),
        ] {
            out.line(format!(
                "static {} {}_{suffix} = {};",
                ty.c_type(),
                symbol(id),
                number_literal(ty, value)
            ));
        }
        any = true;
    }
    if any {
        out.blank();
    }

    for id in &order {
        emit_initializer(out, tree, *id, &symbols);
    }

    out.line(format!("static menu_item_t* {MAIN_MENU_FUNCTION}(void) {{"));
    out.indented(1, format!("return &{};", symbol(&root)));
    out.line("}");
    out.blank();
}

fn symbol_of<'a>(symbols: &'a HashMap<NodeId, String>, id: &NodeId) -> &'a str {
    symbols.get(id).map(String::as_str).unwrap_or("NULL")
}

fn emit_initializer(
    out: &mut Emitter,
    tree: &MenuTree,
    id: NodeId,
    symbols: &HashMap<NodeId, String>,
) {
    let item = &tree[id];
    let Some(symbol) = symbols.get(&id) else {
        return;
    };
    let callback = callback_reference(&item.kind, &item.name);

    out.line(format!("static menu_item_t {symbol} = {{"));
    out.indented(1, ".is_locked = true,");
    out.indented(1, format!(".item_name = {},", c_string_literal(&item.name)));
    match item.parent().and_then(|p| symbols.get(&p)) {
        Some(parent) => out.indented(1, format!(".parent_item = &{parent},")),
        None => out.indented(1, ".parent_item = NULL,"),
    }
    if item.children().is_empty() {
        out.indented(1, ".children_items = NULL,");
    } else {
        out.indented(1, format!(".children_items = {symbol}_children,"));
    }
    out.indented(1, format!(".children_count = {},", item.children().len()));

    match &item.kind {
        ItemKind::Normal => out.indented(1, ".type = MENU_TYPE_NORMAL,"),
        ItemKind::Toggle(t) => {
            out.indented(1, ".type = MENU_TYPE_TOGGLE,");
            out.indented(1, ".data.toggle = {");
            out.indented(2, format!(".state = {},", t.state));
            out.indented(
                2,
                format!(".ref = &g_menu_vars.{},", sanitize(&t.variable_name)),
            );
            out.indented(2, format!(".on_toggle = {callback},"));
            out.indented(1, "},");
        }
        ItemKind::Changeable(c) => {
            out.indented(1, ".type = MENU_TYPE_CHANGEABLE,");
            out.indented(1, ".data.changeable = {");
            out.indented(
                2,
                format!(".ref = &g_menu_vars.{},", sanitize(&c.variable_name)),
            );
            out.indented(2, format!(".min_val = &{symbol}_min_val,"));
            out.indented(2, format!(".max_val = &{symbol}_max_val,"));
            out.indented(2, format!(".step_val = &{symbol}_step_val,"));
            out.indented(2, format!(".data_type = {},", c.data_type().enum_name()));
            out.indented(2, format!(".on_change = {callback},"));
            out.indented(1, "},");
        }
        ItemKind::Application(_) => {
            out.indented(1, ".type = MENU_TYPE_NORMAL,");
            out.indented(1, format!(".app_func = {callback},"));
            out.indented(1, ".app_args = NULL,");
        }
        ItemKind::Exhibition(e) => {
            out.indented(1, ".type = MENU_TYPE_EXHIBITION,");
            out.indented(1, format!(".periodic_callback_with_page = {callback},"));
            out.indented(1, ".data.exhibition = {");
            out.indented(2, ".current_page = 0,");
            out.indented(2, format!(".total_pages = {},", e.total_pages()));
            out.indented(2, ".lines_per_page = MAX_DISPLAY_ITEM - 1,");
            out.indented(1, "},");
        }
    }
    out.line("};");
    out.blank();
}
