use std::{fmt, str::FromStr};

use serde_json::{Map, Value};

use crate::data::{ModelError, NodeId};

/// Storage type of a changeable value, mirroring `data_type_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
}

impl DataType {
    /// All data types in declaration order.
    pub const ALL: [DataType; 11] = [
        DataType::Bool,
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Float,
        DataType::Double,
    ];

    /// Name used in the persisted JSON document.
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Uint8 => "uint8",
            DataType::Uint16 => "uint16",
            DataType::Uint32 => "uint32",
            DataType::Uint64 => "uint64",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float => "float",
            DataType::Double => "double",
        }
    }

    /// C type spelled in generated sources.
    pub fn c_type(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Uint8 => "uint8_t",
            DataType::Uint16 => "uint16_t",
            DataType::Uint32 => "uint32_t",
            DataType::Uint64 => "uint64_t",
            DataType::Int8 => "int8_t",
            DataType::Int16 => "int16_t",
            DataType::Int32 => "int32_t",
            DataType::Int64 => "int64_t",
            DataType::Float => "float",
            DataType::Double => "double",
        }
    }

    /// `data_type_t` enumerator of the runtime.
    pub fn enum_name(self) -> &'static str {
        match self {
            DataType::Bool => "DATA_TYPE_BOOL",
            DataType::Uint8 => "DATA_TYPE_UINT8",
            DataType::Uint16 => "DATA_TYPE_UINT16",
            DataType::Uint32 => "DATA_TYPE_UINT32",
            DataType::Uint64 => "DATA_TYPE_UINT64",
            DataType::Int8 => "DATA_TYPE_INT8",
            DataType::Int16 => "DATA_TYPE_INT16",
            DataType::Int32 => "DATA_TYPE_INT32",
            DataType::Int64 => "DATA_TYPE_INT64",
            DataType::Float => "DATA_TYPE_FLOAT",
            DataType::Double => "DATA_TYPE_DOUBLE",
        }
    }

    /// Representable `(min, max)` of the C type.
    pub fn range(self) -> (f64, f64) {
        match self {
            DataType::Bool => (0.0, 1.0),
            DataType::Uint8 => (0.0, u8::MAX as f64),
            DataType::Uint16 => (0.0, u16::MAX as f64),
            DataType::Uint32 => (0.0, u32::MAX as f64),
            DataType::Uint64 => (0.0, u64::MAX as f64),
            DataType::Int8 => (i8::MIN as f64, i8::MAX as f64),
            DataType::Int16 => (i16::MIN as f64, i16::MAX as f64),
            DataType::Int32 => (i32::MIN as f64, i32::MAX as f64),
            DataType::Int64 => (i64::MIN as f64, i64::MAX as f64),
            DataType::Float => (-(f32::MAX as f64), f32::MAX as f64),
            DataType::Double => (-f64::MAX, f64::MAX),
        }
    }

    /// Whether values of this type are whole numbers.
    pub fn is_integer(self) -> bool {
        !self.is_float()
    }

    /// Whether this is `float` or `double`.
    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::UnknownDataType(s.to_string()))
    }
}

/// Kind of a menu node without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKindTag {
    Normal,
    Toggle,
    Changeable,
    Application,
    Exhibition,
}

impl ItemKindTag {
    /// Name used in the persisted JSON document.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKindTag::Normal => "Normal",
            ItemKindTag::Toggle => "Toggle",
            ItemKindTag::Changeable => "Changeable",
            ItemKindTag::Application => "Application",
            ItemKindTag::Exhibition => "Exhibition",
        }
    }
}

impl fmt::Display for ItemKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKindTag {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(ItemKindTag::Normal),
            "Toggle" => Ok(ItemKindTag::Toggle),
            "Changeable" => Ok(ItemKindTag::Changeable),
            "Application" => Ok(ItemKindTag::Application),
            "Exhibition" => Ok(ItemKindTag::Exhibition),
            other => Err(ModelError::UnknownKind(other.to_string())),
        }
    }
}

/// On/off switch bound to a `bool` variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleItem {
    pub state: bool,
    pub variable_name: String,
    pub enable_callback: bool,
}

impl ToggleItem {
    pub fn new(variable_name: impl Into<String>) -> Self {
        Self {
            state: false,
            variable_name: variable_name.into(),
            enable_callback: false,
        }
    }
}

/// Numeric value edited in place with a step, clamped to `[min_val, max_val]`.
///
/// The numeric fields are private so that every mutation goes through the
/// setters, which keep `min_val <= current_val <= max_val` and a positive
/// step for the configured [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeableItem {
    pub variable_name: String,
    pub enable_callback: bool,
    data_type: DataType,
    min_val: f64,
    max_val: f64,
    step_val: f64,
    current_val: f64,
}

impl ChangeableItem {
    pub fn new(variable_name: impl Into<String>) -> Self {
        let mut item = Self {
            variable_name: variable_name.into(),
            enable_callback: false,
            data_type: DataType::Float,
            min_val: 0.0,
            max_val: 100.0,
            step_val: 1.0,
            current_val: 0.0,
        };
        item.reset_current_val();
        item
    }

    /// Build from raw bounds, normalizing them like an interactive edit would.
    pub fn with_bounds(
        variable_name: impl Into<String>,
        data_type: DataType,
        min_val: f64,
        max_val: f64,
        step_val: f64,
    ) -> Self {
        let mut item = Self::new(variable_name);
        item.data_type = data_type;
        item.min_val = min_val;
        item.max_val = max_val;
        item.step_val = step_val;
        item.validate_and_clamp();
        item.reset_current_val();
        item
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn min_val(&self) -> f64 {
        self.min_val
    }

    pub fn max_val(&self) -> f64 {
        self.max_val
    }

    pub fn step_val(&self) -> f64 {
        self.step_val
    }

    pub fn current_val(&self) -> f64 {
        self.current_val
    }

    /// Value a freshly established variable takes for the current bounds.
    ///
    /// `min_val` when the range is strictly positive, `max_val` when it is
    /// strictly negative, otherwise zero.
    pub fn initial_value(&self) -> f64 {
        initial_value(self.min_val, self.max_val)
    }

    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
        self.validate_and_clamp();
    }

    pub fn set_min_val(&mut self, min_val: f64) {
        self.min_val = min_val;
        self.validate_and_clamp();
    }

    pub fn set_max_val(&mut self, max_val: f64) {
        self.max_val = max_val;
        self.validate_and_clamp();
    }

    pub fn set_step_val(&mut self, step_val: f64) {
        self.step_val = step_val;
        self.validate_and_clamp();
    }

    /// Set the live value, clamped to the bounds.
    pub fn set_current_val(&mut self, value: f64) {
        self.current_val = if value.is_nan() { self.initial_value() } else { value };
        self.clamp_current();
    }

    /// Re-establish `current_val` from the bounds.
    pub fn reset_current_val(&mut self) {
        self.current_val = self.initial_value();
        self.clamp_current();
    }

    /// Step up, saturating at `max_val`.
    pub fn increment(&mut self) {
        self.current_val = (self.current_val + self.step_val).min(self.max_val);
    }

    /// Step down, saturating at `min_val`.
    pub fn decrement(&mut self) {
        self.current_val = (self.current_val - self.step_val).max(self.min_val);
    }

    fn validate_and_clamp(&mut self) {
        let (lo, hi) = self.data_type.range();
        let integer = self.data_type.is_integer();
        let fit = |v: f64, fallback: f64| {
            let v = if v.is_nan() { fallback } else { v.clamp(lo, hi) };
            if integer { v.trunc() } else { v }
        };

        self.min_val = fit(self.min_val, 0.0);
        self.max_val = fit(self.max_val, 0.0);
        if self.min_val > self.max_val {
            std::mem::swap(&mut self.min_val, &mut self.max_val);
        }

        let step = if self.step_val.is_nan() { 1.0 } else { self.step_val.abs() };
        self.step_val = if integer {
            step.trunc().max(1.0)
        } else {
            step.max(0.01)
        };

        if integer {
            self.current_val = self.current_val.trunc();
        }
        self.clamp_current();
    }

    fn clamp_current(&mut self) {
        if self.current_val.is_nan() {
            self.current_val = self.initial_value();
        }
        self.current_val = self.current_val.clamp(self.min_val, self.max_val);
    }
}

/// First value of a changeable variable for the given bounds.
pub fn initial_value(min_val: f64, max_val: f64) -> f64 {
    if min_val > 0.0 {
        min_val
    } else if max_val < 0.0 {
        max_val
    } else {
        0.0
    }
}

/// Entry that hands control to application code on the device.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationItem {
    pub enable_callback: bool,
}

impl Default for ApplicationItem {
    fn default() -> Self {
        Self {
            enable_callback: true,
        }
    }
}

/// Read-mostly display entry, optionally paginated.
#[derive(Debug, Clone, PartialEq)]
pub struct ExhibitionItem {
    total_pages: u8,
    pub enable_callback: bool,
}

impl Default for ExhibitionItem {
    fn default() -> Self {
        Self {
            total_pages: 1,
            enable_callback: true,
        }
    }
}

impl ExhibitionItem {
    pub fn new(total_pages: u32) -> Self {
        let mut item = Self::default();
        item.set_total_pages(total_pages);
        item
    }

    pub fn total_pages(&self) -> u8 {
        self.total_pages
    }

    /// Page count as `uint8_t`, at least one.
    pub fn set_total_pages(&mut self, total_pages: u32) {
        self.total_pages = total_pages.clamp(1, u8::MAX as u32) as u8;
    }
}

/// Kind of a menu node together with its kind-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// Submenu container; the only kind allowed to own children.
    Normal,
    Toggle(ToggleItem),
    Changeable(ChangeableItem),
    Application(ApplicationItem),
    Exhibition(ExhibitionItem),
}

impl ItemKind {
    /// Defaults of `tag`, deriving variable names from `name`.
    pub fn default_for(tag: ItemKindTag, name: &str) -> Self {
        match tag {
            ItemKindTag::Normal => ItemKind::Normal,
            ItemKindTag::Toggle => ItemKind::Toggle(ToggleItem::new(name)),
            ItemKindTag::Changeable => ItemKind::Changeable(ChangeableItem::new(name)),
            ItemKindTag::Application => ItemKind::Application(ApplicationItem::default()),
            ItemKindTag::Exhibition => ItemKind::Exhibition(ExhibitionItem::default()),
        }
    }

    pub fn tag(&self) -> ItemKindTag {
        match self {
            ItemKind::Normal => ItemKindTag::Normal,
            ItemKind::Toggle(_) => ItemKindTag::Toggle,
            ItemKind::Changeable(_) => ItemKindTag::Changeable,
            ItemKind::Application(_) => ItemKindTag::Application,
            ItemKind::Exhibition(_) => ItemKindTag::Exhibition,
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, ItemKind::Normal)
    }

    /// Variable bound by this kind, if any.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            ItemKind::Toggle(t) => Some(&t.variable_name),
            ItemKind::Changeable(c) => Some(&c.variable_name),
            ItemKind::Normal | ItemKind::Application(_) | ItemKind::Exhibition(_) => None,
        }
    }

    pub fn enable_callback(&self) -> Option<bool> {
        match self {
            ItemKind::Normal => None,
            ItemKind::Toggle(t) => Some(t.enable_callback),
            ItemKind::Changeable(c) => Some(c.enable_callback),
            ItemKind::Application(a) => Some(a.enable_callback),
            ItemKind::Exhibition(e) => Some(e.enable_callback),
        }
    }

    pub fn set_enable_callback(&mut self, enable: bool) -> bool {
        match self {
            ItemKind::Normal => return false,
            ItemKind::Toggle(t) => t.enable_callback = enable,
            ItemKind::Changeable(c) => c.enable_callback = enable,
            ItemKind::Application(a) => a.enable_callback = enable,
            ItemKind::Exhibition(e) => e.enable_callback = enable,
        }
        true
    }
}

/// Per-node state used only while simulating; reset at every session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimState {
    /// `true` while the node is not being edited or navigated into.
    pub is_locked: bool,
    pub current_page: u8,
    pub saved_selected_index: usize,
    pub saved_first_visible_item: usize,
    pub saved_first_visible_item_before_exhibition: usize,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            is_locked: true,
            current_page: 0,
            saved_selected_index: 0,
            saved_first_visible_item: 0,
            saved_first_visible_item_before_exhibition: 0,
        }
    }
}

/// A node of the menu tree.
///
/// Structure (`parent`, `children`) is owned by the [`MenuTree`](crate::data::MenuTree)
/// and only changes through its methods.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub sim: SimState,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl MenuItem {
    /// Create a detached item with the defaults of `tag`.
    pub fn new(name: impl Into<String>, tag: ItemKindTag) -> Self {
        let name = name.into();
        let kind = ItemKind::default_for(tag, &name);
        Self::with_kind(name, kind)
    }

    /// Create a detached item with an explicit payload.
    pub fn with_kind(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            kind,
            sim: SimState::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn tag(&self) -> ItemKindTag {
        self.kind.tag()
    }

    /// Name identifiers are derived from: the variable for Toggle and
    /// Changeable, the display name otherwise.
    pub fn effective_name(&self) -> &str {
        self.kind.variable_name().unwrap_or(&self.name)
    }

    /// Switch kind, resetting every kind-specific field to its default.
    ///
    /// Setting the current kind again keeps the payload untouched.
    pub fn set_kind(&mut self, tag: ItemKindTag) {
        if self.kind.tag() == tag {
            return;
        }
        self.kind = ItemKind::default_for(tag, &self.name);
        self.sim = SimState::default();
    }

    /// Serialize the item's own fields (children excluded).
    pub fn fields_as_json(&self) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert("name".into(), Value::String(self.name.clone()));
        obj.insert("type".into(), Value::String(self.tag().as_str().into()));
        obj.insert("id".into(), Value::String(self.id.clone()));
        obj.insert("is_locked".into(), Value::Bool(self.sim.is_locked));

        if let Some(var) = self.kind.variable_name() {
            obj.insert("variable_name".into(), Value::String(var.to_string()));
        }

        match &self.kind {
            ItemKind::Normal => {}
            ItemKind::Toggle(t) => {
                obj.insert("state".into(), Value::Bool(t.state));
                obj.insert("enable_callback".into(), Value::Bool(t.enable_callback));
            }
            ItemKind::Changeable(c) => {
                let integer = c.data_type.is_integer();
                obj.insert("data_type".into(), Value::String(c.data_type.as_str().into()));
                obj.insert("min_val".into(), number_value(c.min_val, integer));
                obj.insert("max_val".into(), number_value(c.max_val, integer));
                obj.insert("step_val".into(), number_value(c.step_val, integer));
                obj.insert("current_val".into(), number_value(c.current_val, integer));
                obj.insert("enable_callback".into(), Value::Bool(c.enable_callback));
            }
            ItemKind::Application(a) => {
                obj.insert("enable_callback".into(), Value::Bool(a.enable_callback));
            }
            ItemKind::Exhibition(e) => {
                obj.insert("total_pages".into(), Value::from(e.total_pages));
                obj.insert("enable_callback".into(), Value::Bool(e.enable_callback));
            }
        }
        obj
    }

    /// Build a detached item from its JSON object; `children` are ignored.
    ///
    /// Absent optional fields take the kind's defaults and an absent `id`
    /// is regenerated.
    pub fn from_json_fields(value: &Value, path: &str) -> Result<Self, ModelError> {
        let obj = value.as_object().ok_or_else(|| ModelError::TypeMismatch {
            path: path.to_string(),
            expected: "object".to_string(),
            actual: format!("{value}"),
        })?;

        let name = required_str(obj, "name", path)?;
        let tag: ItemKindTag = required_str(obj, "type", path)?.parse()?;
        let mut item = MenuItem::new(name, tag);

        if let Some(id) = optional_str(obj, "id", path)? {
            item.id = id.to_string();
        }
        item.sim.is_locked = optional_bool(obj, "is_locked", path)?.unwrap_or(true);
        let variable_name = optional_str(obj, "variable_name", path)?;

        match &mut item.kind {
            ItemKind::Normal => {}
            ItemKind::Toggle(t) => {
                if let Some(var) = variable_name {
                    t.variable_name = var.to_string();
                }
                t.state = optional_bool(obj, "state", path)?.unwrap_or(false);
                t.enable_callback = optional_bool(obj, "enable_callback", path)?.unwrap_or(false);
            }
            ItemKind::Changeable(c) => {
                let data_type = match optional_str(obj, "data_type", path)? {
                    Some(s) => s.parse()?,
                    None => DataType::Float,
                };
                let var = variable_name.unwrap_or(&c.variable_name).to_string();
                let mut loaded = ChangeableItem::with_bounds(
                    var,
                    data_type,
                    optional_f64(obj, "min_val", path)?.unwrap_or(0.0),
                    optional_f64(obj, "max_val", path)?.unwrap_or(100.0),
                    optional_f64(obj, "step_val", path)?.unwrap_or(1.0),
                );
                if let Some(current) = optional_f64(obj, "current_val", path)? {
                    loaded.set_current_val(current);
                }
                loaded.enable_callback =
                    optional_bool(obj, "enable_callback", path)?.unwrap_or(false);
                *c = loaded;
            }
            ItemKind::Application(a) => {
                a.enable_callback = optional_bool(obj, "enable_callback", path)?.unwrap_or(true);
            }
            ItemKind::Exhibition(e) => {
                let pages = optional_f64(obj, "total_pages", path)?.unwrap_or(1.0);
                e.set_total_pages(pages.max(1.0) as u32);
                e.enable_callback = optional_bool(obj, "enable_callback", path)?.unwrap_or(true);
            }
        }

        Ok(item)
    }
}

/// Random identifier in uuid-v4 layout.
pub fn new_id() -> String {
    let mut v: u128 = rand::random();
    v = (v & !(0xF << 76)) | (0x4 << 76);
    v = (v & !(0x3 << 62)) | (0x2 << 62);
    let s = format!("{v:032x}");
    format!(
        "{}-{}-{}-{}-{}",
        &s[0..8],
        &s[8..12],
        &s[12..16],
        &s[16..20],
        &s[20..32]
    )
}

fn number_value(v: f64, integer: bool) -> Value {
    if integer && v.abs() < 9.0e15 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::from(0))
    }
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a str, ModelError> {
    optional_str(obj, key, path)?.ok_or_else(|| ModelError::MissingField {
        path: path.to_string(),
        field: key.to_string(),
    })
}

fn optional_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<&'a str>, ModelError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(mismatch(path, key, "string", other)),
    }
}

fn optional_bool(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<bool>, ModelError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(mismatch(path, key, "boolean", other)),
    }
}

fn optional_f64(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<f64>, ModelError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| mismatch(path, key, "number", &Value::Number(n.clone()))),
        Some(other) => Err(mismatch(path, key, "number", other)),
    }
}

fn mismatch(path: &str, key: &str, expected: &str, actual: &Value) -> ModelError {
    ModelError::TypeMismatch {
        path: format!("{path}.{key}"),
        expected: expected.to_string(),
        actual: format!("{actual}"),
    }
}
