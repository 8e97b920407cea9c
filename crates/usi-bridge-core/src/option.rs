//! Typed USI engine options and the per-engine option collection.
//!
//! An engine declares its options with `option name ... type ...` lines
//! during the handshake (see [`crate::parser`]). Each declaration becomes one
//! [`EngineOption`]; the engine's declarations are collected in an
//! [`OptionSet`], partitioned by kind.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{UsiError, UsiResult};

/// The six option kinds USI declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Check,
    Spin,
    Combo,
    Button,
    String,
    Filename,
}

impl OptionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Spin => "spin",
            Self::Combo => "combo",
            Self::Button => "button",
            Self::String => "string",
            Self::Filename => "filename",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Toggle option (`type check`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOption {
    pub name: String,
    pub value: bool,
    pub default: bool,
}

/// Integer range option (`type spin`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinOption {
    pub name: String,
    pub value: i64,
    pub default: i64,
    pub min: i64,
    pub max: i64,
}

/// Enumerated choice option (`type combo`).
///
/// The selection is an index into `vars`, which keeps the engine's
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboOption {
    pub name: String,
    pub index: usize,
    pub vars: Vec<String>,
}

impl ComboOption {
    /// The currently selected value.
    pub fn selected(&self) -> Option<&str> {
        self.vars.get(self.index).map(String::as_str)
    }
}

/// Trigger option (`type button`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonOption {
    pub name: String,
}

/// Free text option (`type string`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringOption {
    pub name: String,
    pub value: String,
    pub default: String,
}

/// File path option (`type filename`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameOption {
    pub name: String,
    pub value: String,
    pub default: String,
}

/// One engine option of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EngineOption {
    Check(CheckOption),
    Spin(SpinOption),
    Combo(ComboOption),
    Button(ButtonOption),
    String(StringOption),
    Filename(FilenameOption),
}

impl EngineOption {
    pub fn name(&self) -> &str {
        match self {
            Self::Check(o) => &o.name,
            Self::Spin(o) => &o.name,
            Self::Combo(o) => &o.name,
            Self::Button(o) => &o.name,
            Self::String(o) => &o.name,
            Self::Filename(o) => &o.name,
        }
    }

    pub fn kind(&self) -> OptionKind {
        match self {
            Self::Check(_) => OptionKind::Check,
            Self::Spin(_) => OptionKind::Spin,
            Self::Combo(_) => OptionKind::Combo,
            Self::Button(_) => OptionKind::Button,
            Self::String(_) => OptionKind::String,
            Self::Filename(_) => OptionKind::Filename,
        }
    }

    /// The `setoption` command that sets the engine to this option's
    /// current value. Buttons carry no value clause.
    pub fn to_usi(&self) -> String {
        match self {
            Self::Check(o) => setoption(&o.name, if o.value { "true" } else { "false" }),
            Self::Spin(o) => setoption(&o.name, &o.value.to_string()),
            Self::Combo(o) => setoption(&o.name, o.selected().unwrap_or_default()),
            Self::Button(o) => format!("setoption name {}", o.name),
            Self::String(o) => setoption(&o.name, &o.value),
            Self::Filename(o) => setoption(&o.name, &o.value),
        }
    }
}

fn setoption(name: &str, value: &str) -> String {
    format!("setoption name {} value {}", name, value)
}

/// A requested change to one option, as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionUpdate {
    pub name: String,
    /// New value in its USI text form. Buttons take none.
    #[serde(default)]
    pub value: Option<String>,
}

impl OptionUpdate {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn press(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Parses `NAME=VALUE`, or a bare `NAME` for a button press.
impl FromStr for OptionUpdate {
    type Err = UsiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim().to_string())),
            None => (s.trim(), None),
        };
        if name.is_empty() {
            return Err(UsiError::InvalidOptionValue {
                name: String::new(),
                detail: format!("expected NAME=VALUE, got `{}`", s),
            });
        }
        Ok(Self {
            name: name.to_string(),
            value,
        })
    }
}

/// All options one engine declared, one entry per name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    checks: BTreeMap<String, CheckOption>,
    spins: BTreeMap<String, SpinOption>,
    combos: BTreeMap<String, ComboOption>,
    buttons: BTreeMap<String, ButtonOption>,
    strings: BTreeMap<String, StringOption>,
    filenames: BTreeMap<String, FilenameOption>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an option. A later declaration with the same name replaces the
    /// earlier one, even across kinds.
    pub fn insert(&mut self, option: EngineOption) -> Option<EngineOption> {
        let previous = self.remove(option.name());
        match option {
            EngineOption::Check(o) => {
                self.checks.insert(o.name.clone(), o);
            }
            EngineOption::Spin(o) => {
                self.spins.insert(o.name.clone(), o);
            }
            EngineOption::Combo(o) => {
                self.combos.insert(o.name.clone(), o);
            }
            EngineOption::Button(o) => {
                self.buttons.insert(o.name.clone(), o);
            }
            EngineOption::String(o) => {
                self.strings.insert(o.name.clone(), o);
            }
            EngineOption::Filename(o) => {
                self.filenames.insert(o.name.clone(), o);
            }
        }
        previous
    }

    pub fn remove(&mut self, name: &str) -> Option<EngineOption> {
        self.checks
            .remove(name)
            .map(EngineOption::Check)
            .or_else(|| self.spins.remove(name).map(EngineOption::Spin))
            .or_else(|| self.combos.remove(name).map(EngineOption::Combo))
            .or_else(|| self.buttons.remove(name).map(EngineOption::Button))
            .or_else(|| self.strings.remove(name).map(EngineOption::String))
            .or_else(|| self.filenames.remove(name).map(EngineOption::Filename))
    }

    pub fn get(&self, name: &str) -> Option<EngineOption> {
        self.checks
            .get(name)
            .cloned()
            .map(EngineOption::Check)
            .or_else(|| self.spins.get(name).cloned().map(EngineOption::Spin))
            .or_else(|| self.combos.get(name).cloned().map(EngineOption::Combo))
            .or_else(|| self.buttons.get(name).cloned().map(EngineOption::Button))
            .or_else(|| self.strings.get(name).cloned().map(EngineOption::String))
            .or_else(|| self.filenames.get(name).cloned().map(EngineOption::Filename))
    }

    pub fn len(&self) -> usize {
        self.checks.len()
            + self.spins.len()
            + self.combos.len()
            + self.buttons.len()
            + self.strings.len()
            + self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn checks(&self) -> &BTreeMap<String, CheckOption> {
        &self.checks
    }

    pub fn spins(&self) -> &BTreeMap<String, SpinOption> {
        &self.spins
    }

    pub fn combos(&self) -> &BTreeMap<String, ComboOption> {
        &self.combos
    }

    pub fn buttons(&self) -> &BTreeMap<String, ButtonOption> {
        &self.buttons
    }

    pub fn strings(&self) -> &BTreeMap<String, StringOption> {
        &self.strings
    }

    pub fn filenames(&self) -> &BTreeMap<String, FilenameOption> {
        &self.filenames
    }

    /// Every option, ordered by kind then name.
    pub fn iter(&self) -> impl Iterator<Item = EngineOption> + '_ {
        let checks = self.checks.values().cloned().map(EngineOption::Check);
        let spins = self.spins.values().cloned().map(EngineOption::Spin);
        let combos = self.combos.values().cloned().map(EngineOption::Combo);
        let buttons = self.buttons.values().cloned().map(EngineOption::Button);
        let strings = self.strings.values().cloned().map(EngineOption::String);
        let filenames = self.filenames.values().cloned().map(EngineOption::Filename);
        checks
            .chain(spins)
            .chain(combos)
            .chain(buttons)
            .chain(strings)
            .chain(filenames)
    }

    /// Validate `update` against the declared option and store the new
    /// value. Returns the updated option so the caller can send its
    /// `setoption` command.
    pub fn apply(&mut self, update: &OptionUpdate) -> UsiResult<EngineOption> {
        let name = update.name.as_str();
        let value = update.value.as_deref();

        if let Some(opt) = self.checks.get_mut(name) {
            opt.value = match required(name, value)? {
                "true" => true,
                "false" => false,
                other => return Err(bad_value(name, format!("expected true or false, got `{}`", other))),
            };
            return Ok(EngineOption::Check(opt.clone()));
        }

        if let Some(opt) = self.spins.get_mut(name) {
            let raw = required(name, value)?;
            let v: i64 = raw
                .parse()
                .map_err(|_| bad_value(name, format!("expected an integer, got `{}`", raw)))?;
            if v < opt.min || v > opt.max {
                return Err(bad_value(
                    name,
                    format!("{} is outside [{}, {}]", v, opt.min, opt.max),
                ));
            }
            opt.value = v;
            return Ok(EngineOption::Spin(opt.clone()));
        }

        if let Some(opt) = self.combos.get_mut(name) {
            let raw = required(name, value)?;
            let index = opt
                .vars
                .iter()
                .position(|v| v == raw)
                .ok_or_else(|| bad_value(name, format!("`{}` is not one of {:?}", raw, opt.vars)))?;
            opt.index = index;
            return Ok(EngineOption::Combo(opt.clone()));
        }

        if let Some(opt) = self.buttons.get(name) {
            if value.is_some() {
                return Err(bad_value(name, "button options take no value"));
            }
            return Ok(EngineOption::Button(opt.clone()));
        }

        if let Some(opt) = self.strings.get_mut(name) {
            opt.value = required(name, value)?.to_string();
            return Ok(EngineOption::String(opt.clone()));
        }

        if let Some(opt) = self.filenames.get_mut(name) {
            opt.value = required(name, value)?.to_string();
            return Ok(EngineOption::Filename(opt.clone()));
        }

        Err(UsiError::UnknownOption {
            name: name.to_string(),
        })
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> UsiResult<&'a str> {
    let value = value.ok_or_else(|| bad_value(name, "a value is required"))?;
    // The value is sent inside a single `setoption` line.
    if value.contains(|c| c == '\n' || c == '\r') {
        return Err(bad_value(name, "value must not contain line breaks"));
    }
    Ok(value)
}

fn bad_value(name: &str, detail: impl Into<String>) -> UsiError {
    UsiError::InvalidOptionValue {
        name: name.to_string(),
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo(name: &str, index: usize) -> EngineOption {
        EngineOption::Combo(ComboOption {
            name: name.into(),
            index,
            vars: vec!["one".into(), "two".into(), "three".into()],
        })
    }

    #[test]
    fn button_usi_has_no_value_clause() {
        let b = EngineOption::Button(ButtonOption {
            name: "btn-name".into(),
        });
        assert_eq!(b.to_usi(), "setoption name btn-name");
        assert_eq!(b.name(), "btn-name");
    }

    #[test]
    fn check_usi() {
        let c = EngineOption::Check(CheckOption {
            name: "chk-name".into(),
            value: true,
            default: true,
        });
        assert_eq!(c.to_usi(), "setoption name chk-name value true");

        let c = EngineOption::Check(CheckOption {
            name: " ".into(),
            value: false,
            default: true,
        });
        assert_eq!(c.to_usi(), "setoption name   value false");
    }

    #[test]
    fn spin_usi_uses_current_value() {
        let s = EngineOption::Spin(SpinOption {
            name: "spn-nm2".into(),
            value: -500,
            default: -100,
            min: -10000,
            max: 1000,
        });
        assert_eq!(s.to_usi(), "setoption name spn-nm2 value -500");
    }

    #[test]
    fn combo_usi_emits_value_at_index() {
        assert_eq!(combo("sel-name", 1).to_usi(), "setoption name sel-name value two");
        assert_eq!(combo(" ", 2).to_usi(), "setoption name   value three");
    }

    #[test]
    fn text_and_filename_usi() {
        let s = EngineOption::String(StringOption {
            name: "str-name".into(),
            value: "engine.exe".into(),
            default: "engine.exe".into(),
        });
        assert_eq!(s.to_usi(), "setoption name str-name value engine.exe");

        let f = EngineOption::Filename(FilenameOption {
            name: "file-name".into(),
            value: String::new(),
            default: String::new(),
        });
        assert_eq!(f.to_usi(), "setoption name file-name value ");
    }

    #[test]
    fn insert_is_last_write_wins_across_kinds() {
        let mut set = OptionSet::new();
        set.insert(combo("Style", 0));
        assert_eq!(set.combos().len(), 1);

        let prev = set.insert(EngineOption::Check(CheckOption {
            name: "Style".into(),
            value: false,
            default: false,
        }));
        assert_eq!(prev, Some(combo("Style", 0)));
        assert_eq!(set.len(), 1);
        assert!(set.combos().is_empty());
        assert_eq!(set.get("Style").map(|o| o.kind()), Some(OptionKind::Check));
    }

    #[test]
    fn apply_validates_spin_range() {
        let mut set = OptionSet::new();
        set.insert(EngineOption::Spin(SpinOption {
            name: "USI_Hash".into(),
            value: 256,
            default: 256,
            min: 1,
            max: 1024,
        }));

        let updated = set.apply(&OptionUpdate::new("USI_Hash", "512")).unwrap();
        assert_eq!(updated.to_usi(), "setoption name USI_Hash value 512");

        let err = set.apply(&OptionUpdate::new("USI_Hash", "4096")).unwrap_err();
        assert!(matches!(err, UsiError::InvalidOptionValue { .. }));
        let err = set.apply(&OptionUpdate::new("USI_Hash", "lots")).unwrap_err();
        assert!(matches!(err, UsiError::InvalidOptionValue { .. }));

        match set.get("USI_Hash") {
            Some(EngineOption::Spin(s)) => assert_eq!(s.value, 512),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn apply_combo_stores_index() {
        let mut set = OptionSet::new();
        set.insert(combo("Style", 0));
        set.apply(&OptionUpdate::new("Style", "three")).unwrap();
        match set.get("Style") {
            Some(EngineOption::Combo(c)) => {
                assert_eq!(c.index, 2);
                assert_eq!(c.selected(), Some("three"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(set.apply(&OptionUpdate::new("Style", "four")).is_err());
    }

    #[test]
    fn apply_button_and_unknown() {
        let mut set = OptionSet::new();
        set.insert(EngineOption::Button(ButtonOption {
            name: "Clear Hash".into(),
        }));
        let pressed = set.apply(&OptionUpdate::press("Clear Hash")).unwrap();
        assert_eq!(pressed.to_usi(), "setoption name Clear Hash");
        assert!(set.apply(&OptionUpdate::new("Clear Hash", "x")).is_err());

        let err = set.apply(&OptionUpdate::new("Nope", "1")).unwrap_err();
        assert!(matches!(err, UsiError::UnknownOption { .. }));
    }

    #[test]
    fn apply_rejects_line_breaks_in_values() {
        let mut set = OptionSet::new();
        set.insert(EngineOption::String(StringOption {
            name: "EvalDir".into(),
            value: "eval".into(),
            default: "eval".into(),
        }));
        set.insert(combo("Style", 0));

        for bad in ["x\ngo infinite", "x\r", "eval\r\nisready"] {
            let err = set.apply(&OptionUpdate::new("EvalDir", bad)).unwrap_err();
            assert!(matches!(err, UsiError::InvalidOptionValue { .. }), "{bad:?}");
        }
        assert!(set.apply(&OptionUpdate::new("Style", "one\ntwo")).is_err());

        match set.get("EvalDir") {
            Some(EngineOption::String(s)) => assert_eq!(s.value, "eval"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn update_from_str() {
        let u: OptionUpdate = "USI_Hash=512".parse().unwrap();
        assert_eq!(u, OptionUpdate::new("USI_Hash", "512"));
        let u: OptionUpdate = "Clear".parse().unwrap();
        assert_eq!(u, OptionUpdate::press("Clear"));
        assert!("=1".parse::<OptionUpdate>().is_err());
    }

    #[test]
    fn option_set_serializes_partitioned() {
        let mut set = OptionSet::new();
        set.insert(combo("Style", 1));
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["combos"]["Style"]["vars"][1], "two");
        assert!(json["checks"].as_object().unwrap().is_empty());
    }
}
