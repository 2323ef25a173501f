//! Whole-story properties over a script that touches every construct.

mod common;

use std::collections::HashSet;

use common::{compile, compile_clean, script};
use serde_json::json;
use skein_grammar::compile_tokens;
use skein_grammar::dump::{parse_dump, render_dump};
use skein_types::{NodeKind, Target};
use strum::IntoEnumIterator;

const SAMPLE: &str = "\
@intro
<chime>
! gold = 3, seen = 0
You stand at a fork. / The air is cold. // Choose.
---
+ {gold >= 1} <west> [Go west] You head west.
  -> west
* [Wait] {| You wait. | You wait again. | Nothing happens.}
+ {-gold} [Pay the toll] {$ gold} coins left.
>
{seen? Again? | First time.}
{~ Rain. | Snow.}
{gold ~ (2) Lucky! | (1) Unlucky.}
-> greet(gold)
@west
{x == 1? yes}
@greet(n)
Hello, {$ n}.
";

#[test]
fn sample_compiles_cleanly() {
    let story = compile_clean(SAMPLE);
    assert_eq!(story.start(), "start");
    assert_eq!(
        story.get("start").and_then(|node| node.next()),
        Some(&Target::node("intro"))
    );
}

#[test]
fn every_node_kind_is_reachable_from_script() {
    let story = compile_clean(SAMPLE);
    let kinds: HashSet<_> = story.nodes().map(|node| node.kind()).collect();
    for kind in NodeKind::iter() {
        assert!(kinds.contains(&kind), "no {kind} node in sample");
    }
}

#[test]
fn names_are_unique() {
    let story = compile_clean(SAMPLE);
    let names: HashSet<_> = story.nodes().map(|node| node.name.as_str()).collect();
    assert_eq!(names.len(), story.len());
}

#[test]
fn compilation_is_deterministic() {
    let first = compile(SAMPLE);
    let second = compile(SAMPLE);
    assert_eq!(first.to_map(), second.to_map());
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn dump_round_trip_compiles_the_same() {
    let tokens = script(SAMPLE);
    let reread = parse_dump(&render_dump(&tokens)).unwrap();
    assert_eq!(reread, tokens);
    let story = compile_tokens(reread).unwrap();
    assert_eq!(story.to_map(), compile(SAMPLE).to_map());
}

#[test]
fn serializes_as_a_map_of_named_nodes() {
    let story = compile_clean(SAMPLE);
    let value = serde_json::to_value(&story).unwrap();
    assert_eq!(value["intro"]["type"], "cue");
    assert_eq!(value["intro"]["cue"], "chime");
    assert_eq!(value["intro"]["next"], "intro.1");
    assert_eq!(value["greet"]["type"], "def");
    assert_eq!(value["greet"]["params"], json!(["n"]));
    assert_eq!(value["greet"]["name"], "greet");
}

#[test]
fn empty_script_returns_at_once() {
    let story = compile_clean("");
    assert_eq!(story.len(), 1);
    assert_eq!(
        story.get("start").map(|node| node.kind()),
        Some(NodeKind::Goto)
    );
    assert_eq!(
        story.get("start").and_then(|node| node.next()),
        Some(&Target::Ret)
    );
}
