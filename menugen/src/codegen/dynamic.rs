use std::collections::HashMap;

use menukit::data::{ItemKind, MenuTree, NodeId};

use super::{Emitter, pool::callback_reference};
use crate::{
    names::{MAIN_MENU_FUNCTION, function_names, sanitize},
    utils::{c_string_literal, number_literal},
};

/// Emit `Create_*_Menu` for every node below `root` in postorder, then
/// `Create_Main_Menu` for the root itself.
pub(crate) fn emit_menu(out: &mut Emitter, tree: &MenuTree, root: NodeId) {
    let names = function_names(tree);

    out.section("menu items");
    for id in tree.postorder(root) {
        if id == root {
            continue;
        }
        let Some(function) = names.get(&id) else {
            continue;
        };
        out.line(format!("static menu_item_t* {function}(void) {{"));
        emit_body(out, tree, id, &names);
        out.line("}");
        out.blank();
    }

    out.line(format!("static menu_item_t* {MAIN_MENU_FUNCTION}(void) {{"));
    let call = emit_children(out, tree, root, "main_children", &names);
    out.indented(
        1,
        format!(
            "return menu_create_normal_item({}, {call});",
            c_string_literal(&tree[root].name)
        ),
    );
    out.line("}");
    out.blank();
}

fn emit_body(out: &mut Emitter, tree: &MenuTree, id: NodeId, names: &HashMap<NodeId, String>) {
    let item = &tree[id];
    let label = c_string_literal(&item.name);
    let callback = callback_reference(&item.kind, &item.name);

    match &item.kind {
        ItemKind::Normal => {
            let array = format!("{}_children", sanitize(&item.name));
            let call = emit_children(out, tree, id, &array, names);
            out.indented(1, format!("return menu_create_normal_item({label}, {call});"));
        }
        ItemKind::Toggle(t) => {
            out.indented(
                1,
                format!(
                    "return menu_create_toggle_item({label}, &g_menu_vars.{}, {callback});",
                    sanitize(&t.variable_name)
                ),
            );
        }
        ItemKind::Changeable(c) => {
            let var = sanitize(&c.variable_name);
            let ty = c.data_type();
            for (suffix, value) in [
                ("min_val", c.min_val()),
                ("max_val", c.max_val()),
                ("step_val", c.step_val()),
            ] {
                out.indented(
                    1,
                    format!(
                        "static {} {var}_{suffix} = {};",
                        ty.c_type(),
                        number_literal(ty, value)
                    ),
                );
            }
            out.blank();
            out.indented(
                1,
                format!(
                    "return menu_create_changeable_item({label}, &g_menu_vars.{var}, \
                     &{var}_min_val, &{var}_max_val, &{var}_step_val, {}, {callback});",
                    ty.enum_name()
                ),
            );
        }
        ItemKind::Application(_) => {
            out.indented(1, format!("return menu_create_app_item({label}, NULL, {callback});"));
        }
        ItemKind::Exhibition(e) => {
            out.indented(
                1,
                format!(
                    "return menu_create_exhibition_item({label}, {}, {callback});",
                    e.total_pages()
                ),
            );
        }
    }
}

/// Fill a local children array and return the `children, count` arguments
/// for `menu_create_normal_item`.
fn emit_children(
    out: &mut Emitter,
    tree: &MenuTree,
    id: NodeId,
    array: &str,
    names: &HashMap<NodeId, String>,
) -> String {
    let children = tree[id].children();
    if children.is_empty() {
        out.indented(1, "static menu_item_t** no_children = NULL;");
        out.blank();
        return "no_children, 0".to_string();
    }

    out.indented(1, format!("static menu_item_t* {array}[{}];", children.len()));
    out.blank();
    for (i, child) in children.iter().enumerate() {
        if let Some(function) = names.get(child) {
            out.indented(1, format!("{array}[{i}] = {function}();"));
        }
    }
    out.blank();
    format!("{array}, {}", children.len())
}

#[cfg(test)]
mod tests {
    use crate::codegen::{GeneratorStyle, generate};
    use menukit::data::{
        ChangeableItem, DataType, ItemKind, ItemKindTag, MenuConfig, MenuItem, ToggleItem,
    };

    fn sample() -> MenuConfig {
        let mut config = MenuConfig::new_file();
        let root = config.tree.root().unwrap();
        let settings = config
            .tree
            .add_item(Some(root), MenuItem::new("Settings", ItemKindTag::Normal))
            .unwrap();
        let mut toggle = ToggleItem::new("backlight");
        toggle.enable_callback = true;
        config
            .tree
            .add_item(Some(settings), MenuItem::with_kind("Backlight", ItemKind::Toggle(toggle)))
            .unwrap();
        let volume = ChangeableItem::with_bounds("volume", DataType::Uint8, 0.0, 10.0, 1.0);
        config
            .tree
            .add_item(Some(settings), MenuItem::with_kind("Volume", ItemKind::Changeable(volume)))
            .unwrap();
        config
            .tree
            .add_item(Some(root), MenuItem::new("About", ItemKindTag::Normal))
            .unwrap();
        config
    }

    #[test]
    fn test_children_before_parent() {
        let src = generate(&sample(), GeneratorStyle::Dynamic);
        let pos = |s: &str| src.find(s).unwrap_or_else(|| panic!("missing {s}"));

        let backlight = pos("static menu_item_t* Create_Backlight_Menu(void) {");
        let volume = pos("static menu_item_t* Create_Volume_Menu(void) {");
        let settings = pos("static menu_item_t* Create_Settings_Menu(void) {");
        let about = pos("static menu_item_t* Create_About_Menu(void) {");
        let main = pos("static menu_item_t* Create_Main_Menu(void) {");
        assert!(backlight < volume && volume < settings && settings < about && about < main);
    }

    #[test]
    fn test_node_bodies() {
        let src = generate(&sample(), GeneratorStyle::Dynamic);
        assert!(src.contains(
            "    return menu_create_toggle_item(\"Backlight\", &g_menu_vars.backlight, Backlight_Toggle_Callback);"
        ));
        assert!(src.contains("    static uint8_t volume_step_val = 1;"));
        assert!(src.contains(
            "&g_menu_vars.volume, &volume_min_val, &volume_max_val, &volume_step_val, DATA_TYPE_UINT8, NULL);"
        ));
        assert!(src.contains(
            "    static menu_item_t* Settings_children[2];\n\n    Settings_children[0] = Create_Backlight_Menu();\n    Settings_children[1] = Create_Volume_Menu();\n\n    return menu_create_normal_item(\"Settings\", Settings_children, 2);"
        ));
        assert!(src.contains(
            "    static menu_item_t** no_children = NULL;\n\n    return menu_create_normal_item(\"About\", no_children, 0);"
        ));
        assert!(src.contains("    return menu_create_normal_item(\"Main\", main_children, 2);"));
        assert!(src.ends_with("void* getMainItem(void) {\n    return Create_Main_Menu();\n}\n"));
    }

    #[test]
    fn test_duplicate_names_get_suffixes() {
        let mut config = MenuConfig::new_file();
        let root = config.tree.root().unwrap();
        for _ in 0..2 {
            config
                .tree
                .add_item(Some(root), MenuItem::new("Run", ItemKindTag::Application))
                .unwrap();
        }
        let src = generate(&config, GeneratorStyle::Dynamic);
        assert!(src.contains("main_children[0] = Create_Run_Menu();"));
        assert!(src.contains("main_children[1] = Create_Run_Menu_1();"));
        assert_eq!(src.matches("void Run_App_Callback(void** args)").count(), 1);
    }
}
