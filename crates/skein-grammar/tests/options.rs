mod common;

use common::{compile, compile_clean, next, node, text};
use skein_types::{NodeBody, NodeKind, Story};

/// The question and answer entry lists of the option at `name`.
fn parts(story: &Story, name: &str) -> (Vec<String>, Vec<String>) {
    match &node(story, name).body {
        NodeBody::Option {
            question, answer, ..
        } => (question.clone(), answer.clone()),
        other => panic!("{name} is not an option: {other:?}"),
    }
}

fn condition(story: &Story, name: &str) -> String {
    match &node(story, name).body {
        NodeBody::Jump { condition, .. } => condition.to_string(),
        other => panic!("{name} is not a jump: {other:?}"),
    }
}

fn branch(story: &Story, name: &str) -> String {
    match &node(story, name).body {
        NodeBody::Jump {
            branch: Some(target),
            ..
        } => target.to_string(),
        other => panic!("{name} has no branch: {other:?}"),
    }
}

#[test]
fn bracketed_question_then_answer() {
    let story = compile_clean("+ [Look around] You see nothing but fog.");
    assert_eq!(story.len(), 3);
    let (question, answer) = parts(&story, "start");
    assert_eq!(question, ["start.0.1"]);
    assert_eq!(answer, ["start.0.2"]);
    assert_eq!(text(&story, "start.0.1"), "Look around");
    assert_eq!(text(&story, "start.0.2"), "You see nothing but fog.");
    assert_eq!(next(&story, "start.0.1"), "RET");
    // Nothing follows a prompt at top level, so the answer escapes.
    assert_eq!(next(&story, "start.0.2"), "ESC");
    assert_eq!(next(&story, "start"), "RET");
}

#[test]
fn leading_text_is_answer_only() {
    let story = compile_clean("+ foo [bar] baz");
    let (question, answer) = parts(&story, "start");
    assert_eq!(question, ["start.0.2"]);
    assert_eq!(answer, ["start.0.1", "start.0.3"]);
    assert_eq!(next(&story, "start.0.1"), "RET");
    assert_eq!(text(&story, "start.0.3"), "baz");
}

#[test]
fn unbracketed_body_serves_both() {
    let story = compile_clean("+ foo");
    let (question, answer) = parts(&story, "start");
    assert_eq!(question, ["start.0.1"]);
    assert_eq!(answer, ["start.0.1", "start.0.2"]);
    assert_eq!(node(&story, "start.0.2").kind(), NodeKind::Goto);
    assert_eq!(next(&story, "start.0.2"), "ESC");
}

#[test]
fn nested_brackets_share_the_middle() {
    let story = compile_clean("+ a [b [c] d] e");
    let (question, answer) = parts(&story, "start");
    assert_eq!(question, ["start.0.3", "start.0.4"]);
    assert_eq!(answer, ["start.0.1", "start.0.2", "start.0.4", "start.0.5"]);
}

#[test]
fn reversed_brackets_swap_roles() {
    let story = compile_clean("+ foo ] bar [ baz");
    let (question, answer) = parts(&story, "start");
    assert_eq!(question, ["start.0.1", "start.0.3"]);
    assert_eq!(answer, ["start.0.2", "start.0.4"]);
    assert_eq!(node(&story, "start.0.4").kind(), NodeKind::Goto);
}

#[test]
fn unclosed_bracket_is_reported_once() {
    let story = compile("+ a [b");
    assert_eq!(story.diagnostics().len(), 1);
    let (question, answer) = parts(&story, "start");
    assert_eq!(question, ["start.0.2"]);
    assert_eq!(answer, ["start.0.1", "start.0.3"]);
    assert_eq!(node(&story, "start.0.3").kind(), NodeKind::Goto);
}

#[test]
fn stray_bracket_after_the_answer_is_skipped() {
    let story = compile("+ [a] b ] c");
    assert_eq!(story.diagnostics().len(), 1);
    let (_, answer) = parts(&story, "start");
    assert_eq!(answer, ["start.0.2"]);
    assert_eq!(next(&story, "start.0.2"), "start.0.3");
    assert_eq!(text(&story, "start.0.3"), "c");
}

#[test]
fn guards_skip_past_the_option() {
    let story = compile_clean("+ {x}{y} [Go] Gone.\n>");
    assert_eq!(condition(&story, "start"), "not(x)");
    assert_eq!(condition(&story, "start.1"), "not(y)");
    assert_eq!(next(&story, "start"), "start.1");
    assert_eq!(next(&story, "start.1"), "start.2");
    assert_eq!(node(&story, "start.2").kind(), NodeKind::Option);
    assert_eq!(node(&story, "start.3").kind(), NodeKind::Ask);
    assert_eq!(branch(&story, "start"), "start.3");
    assert_eq!(branch(&story, "start.1"), "start.3");
    assert_eq!(next(&story, "start.2"), "start.3");
}

#[test]
fn comparison_guard_is_complemented() {
    let story = compile_clean("+ {gold >= 5} [Buy] Bought.");
    assert_eq!(condition(&story, "start"), "<(gold, 5)");
}

#[test]
fn once_only_option_counts_itself() {
    let story = compile_clean("* [Once] Done.");
    assert_eq!(condition(&story, "start"), "<>(start, 0)");
    let (question, answer) = parts(&story, "start.1");
    assert_eq!(question, ["start.1.2"]);
    assert_eq!(answer, ["start.1.1", "start.1.3"]);
    let NodeBody::Move { target, source, .. } = &node(&story, "start.1.1").body else {
        panic!("expected the counter bump");
    };
    assert_eq!(target.to_string(), "start");
    assert_eq!(source.to_string(), "+(start, 1)");
    assert_eq!(next(&story, "start.1.1"), "RET");
}

#[test]
fn spending_guards_and_deducts() {
    let story = compile_clean("+ {-2 gold} [Buy] Bought.");
    assert_eq!(condition(&story, "start"), "<(gold, 2)");
    let (_, answer) = parts(&story, "start.1");
    assert_eq!(answer[0], "start.1.1");
    let NodeBody::Move { source, .. } = &node(&story, "start.1.1").body else {
        panic!("expected a deduction");
    };
    assert_eq!(source.to_string(), "-(gold, 2)");
}

#[test]
fn setter_consequence() {
    let story = compile_clean("+ {!seen} [Look] Ok.");
    let NodeBody::Move { target, source, .. } = &node(&story, "start.0.1").body else {
        panic!("expected a setter");
    };
    assert_eq!(target.to_string(), "seen");
    assert_eq!(source.to_string(), "1");
}

#[test]
fn keywords_are_collected() {
    let story = compile_clean("+ <north> <go north> [Go north] You go.");
    let NodeBody::Option { keywords, .. } = &node(&story, "start").body else {
        panic!("expected an option");
    };
    let keywords: Vec<_> = keywords.iter().map(String::as_str).collect();
    assert_eq!(keywords, ["go north", "north"]);
}

#[test]
fn answer_continues_in_an_indented_block() {
    let story = compile_clean("+ [Wait] You wait.\n  <tick>\n>\nLater.");
    assert_eq!(next(&story, "start.0.2"), "start.0.3");
    assert_eq!(node(&story, "start.0.3").kind(), NodeKind::Cue);
    assert_eq!(node(&story, "start.1").kind(), NodeKind::Ask);
    assert_eq!(next(&story, "start.0.3"), "start.2");
    assert_eq!(text(&story, "start.2"), "Later.");
}

#[test]
fn question_mark_guard_shorthand() {
    let story = compile_clean("+ {gold > 1?} [Buy] Bought.\n>");
    assert_eq!(condition(&story, "start"), "<=(gold, 1)");
    let (question, answer) = parts(&story, "start.1");
    assert_eq!(question, ["start.1.1"]);
    assert_eq!(answer, ["start.1.2"]);
    assert_eq!(text(&story, "start.1.1"), "Buy");
    assert_eq!(text(&story, "start.1.2"), "Bought.");
    assert_eq!(branch(&story, "start"), "start.2");
}

#[test]
fn reversed_brackets_nest_as_a_mirror() {
    let story = compile_clean("+ a ] b ] c [ d [ e");
    let (question, answer) = parts(&story, "start");
    assert_eq!(question, ["start.0.1", "start.0.2", "start.0.4", "start.0.5"]);
    assert_eq!(answer, ["start.0.3", "start.0.4", "start.0.6"]);
    assert_eq!(node(&story, "start.0.6").kind(), NodeKind::Goto);
    assert_eq!(next(&story, "start.0.5"), "RET");
}

#[test]
fn reversed_form_missing_close_is_reported_once() {
    let story = compile("+ a ] b");
    assert_eq!(story.diagnostics().len(), 1);
    assert_eq!(
        story.diagnostics()[0].message,
        "expected '[', found end of block"
    );
    let (question, answer) = parts(&story, "start");
    assert_eq!(question, ["start.0.1"]);
    assert_eq!(answer, ["start.0.2", "start.0.3"]);
    assert_eq!(node(&story, "start.0.3").kind(), NodeKind::Goto);
}
