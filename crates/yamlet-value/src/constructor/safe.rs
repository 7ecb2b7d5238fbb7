//! Handlers for the YAML 1.1 type repository.

use base64::engine::{Engine, general_purpose::STANDARD as BASE64};
use chrono::{NaiveDate, TimeDelta};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use yamlet_tree::{Error, ErrorKind, NodeGraph, NodeId, NodeKind, Result};

use super::{Constructor, ConstructorRegistry};
use crate::{Collection, Handle, Key, Value};

static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9][0-9][0-9][0-9])-([0-9][0-9]?)-([0-9][0-9]?)(?:(?:[Tt]|[\x20\t]+)([0-9][0-9]?):([0-9][0-9]):([0-9][0-9])(?:\.([0-9]*))?(?:[\x20\t]*(Z|([-+])([0-9][0-9]?)(?::([0-9][0-9]))?))?)?$",
    )
    .expect("timestamp pattern is valid")
});

pub(super) fn register(registry: &mut ConstructorRegistry) {
    let tags: [(&str, super::ConstructFn); 13] = [
        ("null", construct_null),
        ("bool", construct_bool),
        ("int", construct_int),
        ("float", construct_float),
        ("binary", construct_binary),
        ("timestamp", construct_timestamp),
        ("omap", construct_omap),
        ("pairs", construct_pairs),
        ("set", construct_set),
        ("str", construct_str),
        ("seq", construct_seq),
        ("map", construct_map),
        ("value", construct_str),
    ];
    for (name, handler) in tags {
        registry.add_constructor(format!("tag:yaml.org,2002:{name}"), handler);
    }
    registry.set_wildcard_constructor(Some(construct_undefined));
}

fn scalar_error(graph: &NodeGraph, id: NodeId, problem: String) -> Error {
    Error::new(ErrorKind::Constructor, problem).with_mark(graph[id].start_mark.clone())
}

fn construct_undefined(_: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    Err(scalar_error(
        graph,
        id,
        format!(
            "could not determine a constructor for the tag {:?}",
            graph[id].tag
        ),
    ))
}

fn construct_null(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    ctx.construct_scalar(graph, id)?;
    Ok(Value::Null)
}

fn construct_bool(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    let text = ctx.construct_scalar(graph, id)?;
    match text.to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" => Ok(Value::Bool(true)),
        "no" | "false" | "off" => Ok(Value::Bool(false)),
        _ => Err(scalar_error(
            graph,
            id,
            format!("could not convert {text:?} to a boolean"),
        )),
    }
}

fn construct_int(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    let text = ctx.construct_scalar(graph, id)?;
    parse_int(text)
        .map(Value::Int)
        .ok_or_else(|| scalar_error(graph, id, format!("could not convert {text:?} to an integer")))
}

/// Parse a YAML 1.1 integer: sign, `_` separators, `0b`, `0x`, `0o`,
/// leading-zero octal and base-60 groups. `None` on malformed text or
/// overflow.
pub(crate) fn parse_int(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let (negative, digits) = split_sign(&cleaned);
    let magnitude: u64 = if digits == "0" {
        0
    } else if let Some(bin) = digits.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()?
    } else if let Some(hex) = digits.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()?
    } else if digits.contains(':') {
        // Most significant group first.
        digits.split(':').try_fold(0u64, |acc, group| {
            acc.checked_mul(60)?.checked_add(group.parse::<u64>().ok()?)
        })?
    } else {
        digits.parse::<u64>().ok()?
    };
    if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

fn construct_float(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    let text = ctx.construct_scalar(graph, id)?;
    parse_float(text)
        .map(Value::Float)
        .ok_or_else(|| scalar_error(graph, id, format!("could not convert {text:?} to a float")))
}

/// Parse a YAML 1.1 float: `.inf`, `.nan`, base-60 groups or a decimal.
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    let (negative, digits) = split_sign(&cleaned);
    let sign = if negative { -1.0 } else { 1.0 };
    let magnitude = if digits == ".inf" {
        f64::INFINITY
    } else if digits == ".nan" {
        return Some(f64::NAN);
    } else if digits.contains(':') {
        digits.split(':').try_fold(0.0f64, |acc, group| {
            Some(acc * 60.0 + group.parse::<f64>().ok()?)
        })?
    } else {
        digits.parse::<f64>().ok()?
    };
    Some(sign * magnitude)
}

fn construct_binary(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    let text = ctx.construct_scalar(graph, id)?;
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map(Value::Binary)
        .map_err(|err| scalar_error(graph, id, format!("failed to decode base64 data: {err}")))
}

fn construct_timestamp(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    let text = ctx.construct_scalar(graph, id)?;
    let invalid = || scalar_error(graph, id, format!("invalid timestamp {text:?}"));
    let caps = TIMESTAMP_RE.captures(text).ok_or_else(invalid)?;
    let number = |index: usize| -> Option<u32> { caps.get(index)?.as_str().parse().ok() };

    let year = caps
        .get(1)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .ok_or_else(invalid)?;
    let (month, day) = (number(2).ok_or_else(invalid)?, number(3).ok_or_else(invalid)?);
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

    let Some(hour) = number(4) else {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
        return Ok(Value::Timestamp(midnight.and_utc()));
    };
    let (minute, second) = (number(5).ok_or_else(invalid)?, number(6).ok_or_else(invalid)?);
    let mut datetime = date.and_hms_opt(hour, minute, second).ok_or_else(invalid)?;

    if let Some(fraction) = caps.get(7).filter(|m| !m.as_str().is_empty()) {
        let mut micros: String = fraction.as_str().chars().take(6).collect();
        while micros.len() < 6 {
            micros.push('0');
        }
        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        datetime += TimeDelta::milliseconds((micros + 500) / 1000);
    }

    if let Some(sign) = caps.get(9) {
        let hours = i64::from(number(10).unwrap_or(0));
        let minutes = i64::from(number(11).unwrap_or(0));
        let offset = TimeDelta::hours(hours) + TimeDelta::minutes(minutes);
        // Local time minus the offset gives UTC.
        if sign.as_str() == "-" {
            datetime += offset;
        } else {
            datetime -= offset;
        }
    }
    Ok(Value::Timestamp(datetime.and_utc()))
}

fn construct_str(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    ctx.construct_scalar(graph, id).map(Value::from)
}

fn construct_seq(ctx: &mut Constructor, _graph: &NodeGraph, id: NodeId) -> Result<Value> {
    Ok(ctx.defer_collection(id, Collection::Seq(Vec::new()), fill_seq))
}

fn construct_map(ctx: &mut Constructor, _graph: &NodeGraph, id: NodeId) -> Result<Value> {
    Ok(ctx.defer_collection(id, Collection::Map(IndexMap::new()), fill_map))
}

pub(super) fn fill_seq(
    ctx: &mut Constructor,
    graph: &NodeGraph,
    id: NodeId,
    target: Handle,
) -> Result<()> {
    let items = ctx.construct_sequence(graph, id)?;
    if let Some(Collection::Seq(slot)) = ctx.collection_mut(target) {
        *slot = items;
    }
    Ok(())
}

pub(super) fn fill_map(
    ctx: &mut Constructor,
    graph: &NodeGraph,
    id: NodeId,
    target: Handle,
) -> Result<()> {
    let map = ctx.construct_mapping(graph, id)?;
    if let Some(Collection::Map(slot)) = ctx.collection_mut(target) {
        *slot = map;
    }
    Ok(())
}

fn construct_set(ctx: &mut Constructor, _graph: &NodeGraph, id: NodeId) -> Result<Value> {
    Ok(ctx.defer_collection(id, Collection::Set(IndexSet::new()), fill_set))
}

fn fill_set(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId, target: Handle) -> Result<()> {
    let members: IndexSet<Key> = ctx.construct_mapping(graph, id)?.into_keys().collect();
    if let Some(Collection::Set(slot)) = ctx.collection_mut(target) {
        *slot = members;
    }
    Ok(())
}

fn construct_omap(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    check_pair_list("an ordered map", graph, id)?;
    Ok(ctx.defer_collection(id, Collection::Omap(Vec::new()), fill_omap))
}

fn construct_pairs(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId) -> Result<Value> {
    check_pair_list("pairs", graph, id)?;
    Ok(ctx.defer_collection(id, Collection::Pairs(Vec::new()), fill_pairs))
}

fn check_pair_list(what: &str, graph: &NodeGraph, id: NodeId) -> Result<()> {
    let node = &graph[id];
    if node.kind() == NodeKind::Sequence {
        return Ok(());
    }
    Err(Error::new(
        ErrorKind::Constructor,
        format!("expected a sequence but found {}", node.kind()),
    )
    .with_context(format!("while constructing {what}"), node.start_mark.clone())
    .with_mark(node.start_mark.clone()))
}

fn pair_list(
    what: &str,
    ctx: &mut Constructor,
    graph: &NodeGraph,
    id: NodeId,
) -> Result<Vec<(Value, Value)>> {
    let node = &graph[id];
    let items = node.as_sequence().unwrap_or_default();
    let mut pairs = Vec::with_capacity(items.len());
    for &item in items {
        let entry = &graph[item];
        let single = entry.as_mapping().filter(|pairs| pairs.len() == 1);
        let Some(&[(key, value)]) = single else {
            return Err(Error::new(
                ErrorKind::Constructor,
                format!("expected a mapping of length 1 but found {}", entry.kind()),
            )
            .with_context(format!("while constructing {what}"), node.start_mark.clone())
            .with_mark(entry.start_mark.clone()));
        };
        let key = ctx.construct_object(graph, key)?;
        let value = ctx.construct_object(graph, value)?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn fill_omap(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId, target: Handle) -> Result<()> {
    let pairs = pair_list("an ordered map", ctx, graph, id)?;
    if let Some(Collection::Omap(slot)) = ctx.collection_mut(target) {
        *slot = pairs;
    }
    Ok(())
}

fn fill_pairs(ctx: &mut Constructor, graph: &NodeGraph, id: NodeId, target: Handle) -> Result<()> {
    let pairs = pair_list("pairs", ctx, graph, id)?;
    if let Some(Collection::Pairs(slot)) = ctx.collection_mut(target) {
        *slot = pairs;
    }
    Ok(())
}
