//! Parsing of the engine's handshake output: `id` and `option` lines.
//!
//! The grammars are strict. Any deviation is an error, because the
//! handshake treats an unparseable declaration as fatal.

use crate::error::{UsiError, UsiResult};
use crate::option::{
    ButtonOption, CheckOption, ComboOption, EngineOption, FilenameOption, SpinOption,
    StringOption,
};

const CHECK_FORMAT: &str = "option name <string> type check default <bool>";
const SPIN_FORMAT: &str = "option name <string> type spin default <int> min <int> max <int>";
const COMBO_FORMAT: &str = "option name <string> type combo default <string> rep(var <string>)";
const BUTTON_FORMAT: &str = "option name <string> type button";
const STRING_FORMAT: &str = "option name <string> type string default <string>";
const FILENAME_FORMAT: &str = "option name <string> type filename default <string>";

/// Which identity fact an `id` line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Name,
    Author,
}

/// A parsed `id name ...` / `id author ...` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub field: IdentityField,
    pub value: String,
}

fn tokenize(line: &str) -> Vec<&str> {
    line.trim().split(' ').collect()
}

/// Parse `id name <tokens...>` or `id author <tokens...>`.
///
/// Trailing tokens are rejoined with single spaces, so multi-word names
/// survive.
pub fn parse_identity(line: &str) -> UsiResult<Identity> {
    let tokens = tokenize(line);
    if tokens.len() < 3 || tokens[0] != "id" {
        return Err(UsiError::InvalidIdentitySyntax {
            detail: format!(
                "the format must be [id name <string>] or [id author <string>], received `{}`",
                line.trim()
            ),
        });
    }

    let field = match tokens[1] {
        "name" => IdentityField::Name,
        "author" => IdentityField::Author,
        other => {
            return Err(UsiError::UnknownIdentityField {
                field: other.to_string(),
            })
        }
    };

    Ok(Identity {
        field,
        value: tokens[2..].join(" "),
    })
}

/// Parse one `option name <N> type <kind> ...` line.
pub fn parse_option(line: &str) -> UsiResult<EngineOption> {
    let tokens = tokenize(line);
    if tokens.len() < 5
        || tokens[0] != "option"
        || tokens[1] != "name"
        || tokens[3] != "type"
        || tokens[2].is_empty()
        || tokens[4].is_empty()
    {
        return Err(UsiError::invalid_option(format!(
            "the format must be [option name <string> type <kind> ...], received `{}`",
            line.trim()
        )));
    }

    match tokens[4] {
        "check" => parse_check(&tokens),
        "spin" => parse_spin(&tokens),
        "combo" => parse_combo(&tokens),
        "button" => parse_button(&tokens),
        "string" => parse_string(&tokens).map(|(name, value)| {
            EngineOption::String(StringOption {
                name,
                default: value.clone(),
                value,
            })
        }),
        "filename" => parse_filename(&tokens).map(|(name, value)| {
            EngineOption::Filename(FilenameOption {
                name,
                default: value.clone(),
                value,
            })
        }),
        other => Err(UsiError::UnknownOptionType {
            kind: other.to_string(),
        }),
    }
}

fn malformed(kind: &str, format: &str) -> UsiError {
    UsiError::invalid_option(format!(
        "received option type was '{}', but malformed. The format must be [{}]",
        kind, format
    ))
}

fn parse_check(t: &[&str]) -> UsiResult<EngineOption> {
    if t.len() != 7 || t[5] != "default" || t[6].is_empty() {
        return Err(malformed("check", CHECK_FORMAT));
    }
    let default = match t[6] {
        "true" => true,
        "false" => false,
        other => {
            return Err(UsiError::invalid_option(format!(
                "default value of 'check' type was not bool, received `{}`",
                other
            )))
        }
    };
    Ok(EngineOption::Check(CheckOption {
        name: t[2].to_string(),
        value: default,
        default,
    }))
}

fn parse_int(field: &str, raw: &str) -> UsiResult<i64> {
    raw.parse().map_err(|_| {
        UsiError::invalid_option(format!(
            "{} value of 'spin' type was not int, received `{}`",
            field, raw
        ))
    })
}

fn parse_spin(t: &[&str]) -> UsiResult<EngineOption> {
    if t.len() != 11 || t[5] != "default" || t[7] != "min" || t[9] != "max" {
        return Err(malformed("spin", SPIN_FORMAT));
    }
    let default = parse_int("default", t[6])?;
    let min = parse_int("min", t[8])?;
    let max = parse_int("max", t[10])?;
    if min > max || default < min || default > max {
        return Err(UsiError::invalid_option(format!(
            "'spin' bounds out of order: default {} min {} max {}",
            default, min, max
        )));
    }
    Ok(EngineOption::Spin(SpinOption {
        name: t[2].to_string(),
        value: default,
        default,
        min,
        max,
    }))
}

fn parse_combo(t: &[&str]) -> UsiResult<EngineOption> {
    // 7 fixed tokens followed by one or more `var <v>` pairs.
    if t.len() < 9 || t[5] != "default" || t[6].is_empty() || (t.len() - 7) % 2 != 0 {
        return Err(malformed("combo", COMBO_FORMAT));
    }

    let mut vars = Vec::with_capacity((t.len() - 7) / 2);
    for pair in t[7..].chunks(2) {
        if pair[0] != "var" || pair[1].is_empty() {
            return Err(malformed("combo", COMBO_FORMAT));
        }
        vars.push(pair[1].to_string());
    }

    let index = vars.iter().position(|v| v == t[6]).ok_or_else(|| {
        UsiError::invalid_option(format!(
            "default value of 'combo' type `{}` was not found in vars",
            t[6]
        ))
    })?;

    Ok(EngineOption::Combo(ComboOption {
        name: t[2].to_string(),
        index,
        vars,
    }))
}

fn parse_button(t: &[&str]) -> UsiResult<EngineOption> {
    if t.len() != 5 {
        return Err(malformed("button", BUTTON_FORMAT));
    }
    Ok(EngineOption::Button(ButtonOption {
        name: t[2].to_string(),
    }))
}

fn parse_default_text(t: &[&str], kind: &str, format: &str) -> UsiResult<(String, String)> {
    if t.len() != 7 || t[5] != "default" || t[6].is_empty() {
        return Err(malformed(kind, format));
    }
    Ok((t[2].to_string(), t[6].to_string()))
}

fn parse_string(t: &[&str]) -> UsiResult<(String, String)> {
    parse_default_text(t, "string", STRING_FORMAT)
}

fn parse_filename(t: &[&str]) -> UsiResult<(String, String)> {
    parse_default_text(t, "filename", FILENAME_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identity_joins_multi_token_values() {
        let id = parse_identity("id name Foo Bar").unwrap();
        assert_eq!(id.field, IdentityField::Name);
        assert_eq!(id.value, "Foo Bar");

        let id = parse_identity("  id author A. U. Thor  ").unwrap();
        assert_eq!(id.field, IdentityField::Author);
        assert_eq!(id.value, "A. U. Thor");
    }

    #[test]
    fn identity_errors() {
        assert!(matches!(
            parse_identity("id unknown X"),
            Err(UsiError::UnknownIdentityField { field }) if field == "unknown"
        ));
        assert!(matches!(
            parse_identity("id name"),
            Err(UsiError::InvalidIdentitySyntax { .. })
        ));
        assert!(matches!(
            parse_identity("idx name Foo"),
            Err(UsiError::InvalidIdentitySyntax { .. })
        ));
    }

    #[test]
    fn check_option() {
        let opt = parse_option("option name Ponder type check default true").unwrap();
        assert_eq!(
            opt,
            EngineOption::Check(CheckOption {
                name: "Ponder".into(),
                value: true,
                default: true,
            })
        );
        assert!(parse_option("option name Ponder type check default yes").is_err());
        assert!(parse_option("option name Ponder type check").is_err());
        assert!(parse_option("option name Ponder type check value true").is_err());
    }

    #[test]
    fn spin_option() {
        let opt =
            parse_option("option name USI_Hash type spin default 256 min 1 max 1024").unwrap();
        assert_eq!(
            opt,
            EngineOption::Spin(SpinOption {
                name: "USI_Hash".into(),
                value: 256,
                default: 256,
                min: 1,
                max: 1024,
            })
        );
        assert_eq!(opt.to_usi(), "setoption name USI_Hash value 256");

        for bad in [
            "option name H type spin default x min 1 max 10",
            "option name H type spin default 5 min 1 max ten",
            "option name H type spin min 1 default 5 max 10",
            "option name H type spin default 5 min 10 max 1",
            "option name H type spin default 50 min 1 max 10",
            "option name H type spin default 5 min 1",
        ] {
            assert!(
                matches!(parse_option(bad), Err(UsiError::InvalidOptionSyntax { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn combo_option_index_follows_declaration_order() {
        let opt = parse_option(
            "option name Style type combo default Normal var Solid var Normal var Risky",
        )
        .unwrap();
        match &opt {
            EngineOption::Combo(c) => {
                assert_eq!(c.vars, vec!["Solid", "Normal", "Risky"]);
                assert_eq!(c.index, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(opt.to_usi(), "setoption name Style value Normal");
    }

    #[test]
    fn combo_default_must_be_a_var() {
        let err = parse_option("option name Style type combo default normal var Normal var Risky")
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(parse_option("option name Style type combo default Normal var").is_err());
        assert!(parse_option("option name Style type combo default A var A val B").is_err());
        assert!(parse_option("option name Style type combo default A var A var").is_err());
    }

    #[test]
    fn button_string_filename() {
        assert_eq!(
            parse_option("option name Clear type button").unwrap(),
            EngineOption::Button(ButtonOption {
                name: "Clear".into()
            })
        );
        assert!(parse_option("option name Clear type button now").is_err());

        match parse_option("option name Book type string default book.db").unwrap() {
            EngineOption::String(s) => {
                assert_eq!(s.value, "book.db");
                assert_eq!(s.default, "book.db");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_option("option name Book type string default").is_err());

        match parse_option("option name EvalDir type filename default eval").unwrap() {
            EngineOption::Filename(f) => assert_eq!(f.value, "eval"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_option("option name EvalDir type filename eval x").is_err());
    }

    #[test]
    fn option_prefix_errors() {
        assert!(matches!(
            parse_option("option name X type"),
            Err(UsiError::InvalidOptionSyntax { .. })
        ));
        assert!(matches!(
            parse_option("option nam X type check default true"),
            Err(UsiError::InvalidOptionSyntax { .. })
        ));
        assert!(matches!(
            parse_option("option name  type check default true"),
            Err(UsiError::InvalidOptionSyntax { .. })
        ));
        assert!(matches!(
            parse_option("option name X type slider default 1"),
            Err(UsiError::UnknownOptionType { kind }) if kind == "slider"
        ));
    }

    proptest! {
        #[test]
        fn check_round_trip(name in "[A-Za-z_][A-Za-z0-9_]{0,15}", b in any::<bool>()) {
            let line = format!("option name {} type check default {}", name, b);
            match parse_option(&line).unwrap() {
                EngineOption::Check(c) => {
                    prop_assert_eq!(c.value, b);
                    prop_assert_eq!(c.default, b);
                    prop_assert_eq!(
                        EngineOption::Check(c).to_usi(),
                        format!("setoption name {} value {}", name, b)
                    );
                }
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }

        #[test]
        fn spin_round_trip(a in -10_000i64..10_000, b in -10_000i64..10_000, c in -10_000i64..10_000) {
            let mut v = [a, b, c];
            v.sort_unstable();
            let [min, default, max] = v;
            let line = format!("option name S type spin default {} min {} max {}", default, min, max);
            let opt = parse_option(&line).unwrap();
            prop_assert_eq!(opt.to_usi(), format!("setoption name S value {}", default));
        }

        #[test]
        fn spin_never_panics(d in "\\PC{0,6}", mi in "\\PC{0,6}", ma in "\\PC{0,6}") {
            let line = format!("option name S type spin default {} min {} max {}", d, mi, ma);
            let _ = parse_option(&line);
        }
    }
}
