use super::{scope::Scope, Dynamic, Flow, Interpreter, Unwind};
use crate::{host::ConnectionObject, ScriptEnv};
use dbscript_core::Error;

use indexmap::IndexMap;
use std::{cell::RefCell, rc::Rc};

fn fail<T>(message: impl Into<String>) -> Flow<T> {
    Err(Unwind::Error(Error::evaluation(message)))
}

/// Binds the global names every evaluation starts with.
pub(crate) fn install_globals(scope: &Rc<Scope>, env: &ScriptEnv) {
    scope.declare("print", Dynamic::native("print", print), true);
    scope.declare("println", Dynamic::native("println", println), true);
    scope.declare("String", Dynamic::native("String", string), true);
    scope.declare("Number", Dynamic::native("Number", number), true);
    scope.declare("parseInt", Dynamic::native("parseInt", parse_int), true);
    scope.declare("parseFloat", Dynamic::native("parseFloat", parse_float), true);
    scope.declare("isNaN", Dynamic::native("isNaN", is_nan), true);

    let math: IndexMap<String, Dynamic> = [
        ("abs", Dynamic::native("abs", math_abs)),
        ("ceil", Dynamic::native("ceil", math_ceil)),
        ("floor", Dynamic::native("floor", math_floor)),
        ("max", Dynamic::native("max", math_max)),
        ("min", Dynamic::native("min", math_min)),
        ("round", Dynamic::native("round", math_round)),
        ("sqrt", Dynamic::native("sqrt", math_sqrt)),
    ]
    .into_iter()
    .map(|(name, function)| (name.to_string(), function))
    .collect();
    scope.declare("Math", Dynamic::Object(Rc::new(RefCell::new(math))), true);

    if let Some(catalog) = env.catalog() {
        scope.declare("db", Dynamic::host(ConnectionObject::new(catalog.clone())), true);
    }
}

fn join(args: &[Dynamic]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn print(interp: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    interp.sink.write_str(&join(args))?;
    Ok(Dynamic::Undefined)
}

fn println(interp: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    let mut line = join(args);
    line.push('\n');
    interp.sink.write_str(&line)?;
    Ok(Dynamic::Undefined)
}

fn first(args: &[Dynamic]) -> Dynamic {
    args.first().cloned().unwrap_or_default()
}

fn string(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    Ok(match args.first() {
        Some(value) => Dynamic::from(value.to_string()),
        None => Dynamic::from(""),
    })
}

fn number(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    Ok(match args.first() {
        Some(value) => value.to_numeric(),
        None => Dynamic::Int(0),
    })
}

fn parse_int(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    let text = first(args).to_string();
    let radix = match args.get(1).map(Dynamic::to_number) {
        None => 10,
        Some(radix) if (2.0..=36.0).contains(&radix) => radix as u32,
        Some(_) => return Ok(Dynamic::Float(f64::NAN)),
    };

    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits: String = digits.chars().take_while(|c| c.is_digit(radix)).collect();

    Ok(match i64::from_str_radix(&digits, radix) {
        Ok(value) if negative => Dynamic::Int(-value),
        Ok(value) => Dynamic::Int(value),
        Err(_) => Dynamic::Float(f64::NAN),
    })
}

fn parse_float(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    let text = first(args).to_string();
    let text = text.trim();

    // Longest prefix that parses
    let value = (1..=text.len())
        .rev()
        .filter(|&end| text.is_char_boundary(end))
        .find_map(|end| text[..end].parse::<f64>().ok())
        .unwrap_or(f64::NAN);
    Ok(Dynamic::Float(value))
}

fn is_nan(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    Ok(Dynamic::Bool(first(args).to_number().is_nan()))
}

fn rounding(args: &[Dynamic], f: fn(f64) -> f64) -> Dynamic {
    match first(args).to_numeric() {
        Dynamic::Int(v) => Dynamic::Int(v),
        other => {
            let rounded = f(other.to_number());
            if rounded.is_finite() && rounded.abs() < 9.0e15 {
                Dynamic::Int(rounded as i64)
            } else {
                Dynamic::Float(rounded)
            }
        }
    }
}

fn math_floor(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    Ok(rounding(args, f64::floor))
}

fn math_ceil(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    Ok(rounding(args, f64::ceil))
}

fn math_round(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    // JavaScript rounds halves towards positive infinity
    Ok(rounding(args, |v| (v + 0.5).floor()))
}

fn math_abs(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    Ok(match first(args).to_numeric() {
        Dynamic::Int(v) => v.checked_abs().map_or(Dynamic::Float((v as f64).abs()), Dynamic::Int),
        other => Dynamic::Float(other.to_number().abs()),
    })
}

fn math_sqrt(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    Ok(Dynamic::Float(first(args).to_number().sqrt()))
}

fn extremum(args: &[Dynamic], empty: f64, pick_lhs: fn(f64, f64) -> bool) -> Dynamic {
    let mut best: Option<Dynamic> = None;
    for arg in args {
        let candidate = arg.to_numeric();
        if candidate.to_number().is_nan() {
            return Dynamic::Float(f64::NAN);
        }
        best = match best {
            Some(current) if pick_lhs(current.to_number(), candidate.to_number()) => Some(current),
            _ => Some(candidate),
        };
    }
    best.unwrap_or(Dynamic::Float(empty))
}

fn math_max(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    Ok(extremum(args, f64::NEG_INFINITY, |a, b| a >= b))
}

fn math_min(_: &mut Interpreter, args: &[Dynamic]) -> Flow<Dynamic> {
    Ok(extremum(args, f64::INFINITY, |a, b| a <= b))
}

fn index_arg(args: &[Dynamic], position: usize, len: usize, default: usize) -> usize {
    match args.get(position).and_then(Dynamic::as_i64) {
        None => default,
        Some(index) if index < 0 => len.saturating_sub(index.unsigned_abs() as usize),
        Some(index) => (index as usize).min(len),
    }
}

/// Methods of script arrays. `None` when `name` is not one.
pub(crate) fn array_method(
    interp: &mut Interpreter,
    items: &Rc<RefCell<Vec<Dynamic>>>,
    name: &str,
    args: &[Dynamic],
) -> Flow<Option<Dynamic>> {
    Ok(Some(match name {
        "push" => {
            let mut items = items.borrow_mut();
            items.extend_from_slice(args);
            Dynamic::from(items.len())
        }
        "pop" => items.borrow_mut().pop().unwrap_or_default(),
        "join" => {
            let separator = match args.first() {
                Some(separator) if !separator.is_undefined() => separator.to_string(),
                _ => ",".to_string(),
            };
            let joined = items
                .borrow()
                .iter()
                .map(|item| if item.is_nullish() { String::new() } else { item.to_string() })
                .collect::<Vec<_>>()
                .join(&separator);
            Dynamic::from(joined)
        }
        "indexOf" => {
            let needle = first(args);
            let position = items.borrow().iter().position(|item| item.strict_eq(&needle));
            position.map_or(Dynamic::Int(-1), Dynamic::from)
        }
        "slice" => {
            let items = items.borrow();
            let start = index_arg(args, 0, items.len(), 0);
            let end = index_arg(args, 1, items.len(), items.len());
            Dynamic::array(items.get(start..end.max(start)).unwrap_or_default().to_vec())
        }
        "forEach" | "map" => {
            let callback = first(args);
            if !callback.is_callable() {
                return fail(format!("array.{name} expects a function"));
            }
            // Snapshot so the callback may mutate the array
            let snapshot = items.borrow().clone();
            let mut mapped = Vec::with_capacity(snapshot.len());
            for (index, item) in snapshot.into_iter().enumerate() {
                mapped.push(interp.call(&callback, vec![item, Dynamic::from(index)])?);
            }
            if name == "map" {
                Dynamic::array(mapped)
            } else {
                Dynamic::Undefined
            }
        }
        _ => return Ok(None),
    }))
}

/// Methods of script strings. `None` when `name` is not one.
pub(crate) fn string_method(s: &str, name: &str, args: &[Dynamic]) -> Flow<Option<Dynamic>> {
    let arg = |i: usize| args.get(i).map(ToString::to_string).unwrap_or_default();

    Ok(Some(match name {
        "toUpperCase" => Dynamic::from(s.to_uppercase()),
        "toLowerCase" => Dynamic::from(s.to_lowercase()),
        "trim" => Dynamic::from(s.trim()),
        "startsWith" => Dynamic::Bool(s.starts_with(&arg(0))),
        "endsWith" => Dynamic::Bool(s.ends_with(&arg(0))),
        "indexOf" => match s.find(&arg(0)) {
            Some(byte) => Dynamic::from(s[..byte].chars().count()),
            None => Dynamic::Int(-1),
        },
        "substring" => {
            let chars: Vec<char> = s.chars().collect();
            let clamp = |i: usize, default: usize| {
                args.get(i)
                    .and_then(Dynamic::as_i64)
                    .map_or(default, |v| v.clamp(0, chars.len() as i64) as usize)
            };
            let (a, b) = (clamp(0, 0), clamp(1, chars.len()));
            Dynamic::from(chars[a.min(b)..a.max(b)].iter().collect::<String>())
        }
        "split" => {
            let parts = match args.first() {
                None => vec![Dynamic::from(s)],
                Some(separator) => {
                    let separator = separator.to_string();
                    if separator.is_empty() {
                        s.chars().map(|c| Dynamic::from(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Dynamic::from).collect()
                    }
                }
            };
            Dynamic::array(parts)
        }
        _ => return Ok(None),
    }))
}
