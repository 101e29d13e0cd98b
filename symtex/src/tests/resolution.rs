use crate::comparer::resolve;
use crate::limits::ResourceLimits;
use crate::notation::Term;
use crate::response::Notice;
use crate::session::Session;
use crate::solver::{RuleModel, RuleTerm};
use crate::writer;

fn session() -> Session {
    Session::new(ResourceLimits::default()).unwrap()
}

fn declare(s: &mut Session, input: &str) {
    let r = s.exec(input).unwrap();
    assert_eq!(r.rendered.as_deref(), Some("\\textit{True}"), "{input}");
}

fn bindings_of(notices: &[Notice]) -> Vec<Vec<(String, String)>> {
    notices
        .iter()
        .filter_map(|n| match n {
            Notice::Bindings(rows) => Some(rows.clone()),
            _ => None,
        })
        .collect()
}

fn row(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

#[test]
fn test_fact_declaration_acknowledged() {
    let mut s = session();
    declare(&mut s, "\\operatorname{boy}(a)");
    assert_eq!(s.processor.model.len(), 1);
}

#[test]
fn test_rule_declaration_acknowledged() {
    let mut s = session();
    declare(
        &mut s,
        "\\operatorname{child}(#x) \\dashv (\\operatorname{boy}(#x))",
    );
    assert_eq!(s.processor.model.len(), 1);
}

#[test]
fn test_goal_enumerates_most_recent_first() {
    let mut s = session();
    declare(&mut s, "\\operatorname{boy}(a)");
    declare(&mut s, "\\operatorname{boy}(b)");
    declare(
        &mut s,
        "\\operatorname{child}(#x) \\dashv (\\operatorname{boy}(#x))",
    );
    let r = s.exec("goal! \\operatorname{child}(#w)").unwrap();
    assert_eq!(r.rendered.as_deref(), Some("\\textit{True}"));
    assert_eq!(
        bindings_of(&r.notices),
        vec![vec![row("#w", "b")], vec![row("#w", "a")]]
    );
}

#[test]
fn test_failed_goal_has_no_output() {
    let mut s = session();
    declare(&mut s, "\\operatorname{boy}(a)");
    let r = s.exec("goal! \\operatorname{boy}(c)").unwrap();
    assert_eq!(r.rendered, None);
    assert!(bindings_of(&r.notices).is_empty());
}

#[test]
fn test_cut_commits_to_first_answer() {
    let mut s = session();
    declare(&mut s, "\\operatorname{boy}(a)");
    declare(&mut s, "\\operatorname{boy}(b)");
    declare(
        &mut s,
        "\\operatorname{first}(#x) \\dashv (\\operatorname{boy}(#x), !)",
    );
    let r = s.exec("goal! \\operatorname{first}(#y)").unwrap();
    assert_eq!(bindings_of(&r.notices), vec![vec![row("#y", "b")]]);
}

#[test]
fn test_negation_as_failure() {
    let mut s = session();
    declare(&mut s, "\\operatorname{boy}(a)");
    let r = s.exec("goal! \\neg\\operatorname{boy}(c)").unwrap();
    assert_eq!(r.rendered.as_deref(), Some("\\textit{True}"));
    let r = s.exec("goal! \\neg\\operatorname{boy}(a)").unwrap();
    assert_eq!(r.rendered, None);
}

#[test]
fn test_negation_inside_rule_body() {
    let mut s = session();
    declare(&mut s, "\\operatorname{person}(a)");
    declare(&mut s, "\\operatorname{person}(b)");
    declare(&mut s, "\\operatorname{boy}(a)");
    declare(
        &mut s,
        "\\operatorname{girl}(#x) \\dashv (\\operatorname{person}(#x), {\\neg\\operatorname{boy}(#x)})",
    );
    let r = s.exec("goal! \\operatorname{girl}(#g)").unwrap();
    assert_eq!(bindings_of(&r.notices), vec![vec![row("#g", "b")]]);
}

#[test]
fn test_assignment_goal_evaluates() {
    let mut s = session();
    declare(
        &mut s,
        "\\operatorname{double}(#x,#y) \\dashv ({#y \\gets 2 #x})",
    );
    let r = s.exec("goal! \\operatorname{double}(3,#r)").unwrap();
    assert_eq!(bindings_of(&r.notices), vec![vec![row("#r", "6")]]);
}

#[test]
fn test_equality_goal_unifies() {
    let mut s = session();
    let r = s.exec("goal! {#a = 5}").unwrap();
    assert_eq!(bindings_of(&r.notices), vec![vec![row("#a", "5")]]);
}

#[test]
fn test_nested_application_is_flattened() {
    let mut s = session();
    declare(
        &mut s,
        "\\operatorname{double}(#x,#y) \\dashv ({#y \\gets 2 #x})",
    );
    let r = s.exec("goal! {#z = \\operatorname{double}(3)}").unwrap();
    assert_eq!(bindings_of(&r.notices), vec![vec![row("#z", "6")]]);
}

#[test]
fn test_nested_application_uses_caller_bindings() {
    let mut s = session();
    declare(
        &mut s,
        "\\operatorname{double}(#x,#y) \\dashv ({#y \\gets 2 #x})",
    );
    // The nested call must see #w already bound by the caller.
    declare(
        &mut s,
        "\\operatorname{twice}(#w,#q) \\dashv ({#q = \\operatorname{double}(#w)})",
    );
    let r = s.exec("goal! \\operatorname{twice}(3,#r)").unwrap();
    assert_eq!(bindings_of(&r.notices), vec![vec![row("#r", "6")]]);
}

#[test]
fn test_bound_callback() {
    let mut s = session();
    let r = s.exec("goal! \\operatorname{bound}(x)").unwrap();
    assert_eq!(r.rendered.as_deref(), Some("\\textit{True}"));
    let r = s.exec("goal! \\operatorname{bound}(#z)").unwrap();
    assert_eq!(r.rendered, None);
}

#[test]
fn test_list_callback_splits_head_and_tail() {
    let mut s = session();
    let r = s
        .exec("goal! \\operatorname{list}((a,b,c),#h,#t)")
        .unwrap();
    assert_eq!(
        bindings_of(&r.notices),
        vec![vec![row("#h", "a"), row("#t", "b,c")]]
    );
}

#[test]
fn test_apply_callback() {
    let model = RuleModel::new();
    let goal = RuleTerm::from_markup("\\operatorname{apply}(f(y),#n,#a)").unwrap();
    let limits = ResourceLimits::default();
    let sols: Vec<_> = model.search(vec![goal], &limits).collect();
    assert_eq!(sols.len(), 1);
    let (env, nota) = &sols[0];
    assert_eq!(writer::render(resolve(&Term::sym("#n"), env), nota), "f");
    assert_eq!(writer::render(resolve(&Term::sym("#a"), env), nota), "y");
}

#[test]
fn test_index_callback() {
    let model = RuleModel::new();
    let goal = RuleTerm::from_markup("\\operatorname{index}(x^2,#b,#s,#u)").unwrap();
    let limits = ResourceLimits::default();
    let sols: Vec<_> = model.search(vec![goal], &limits).collect();
    assert_eq!(sols.len(), 1);
    let (env, nota) = &sols[0];
    assert_eq!(writer::render(resolve(&Term::sym("#b"), env), nota), "x");
    assert_eq!(writer::render(resolve(&Term::sym("#s"), env), nota), "2");
    assert_eq!(env.get("#u"), Some(&Term::Empty));
}

#[test]
fn test_unbracket_callback() {
    let model = RuleModel::new();
    let goal = RuleTerm::from_markup("\\operatorname{unbracket}((x+1),#y)").unwrap();
    let limits = ResourceLimits::default();
    let sols: Vec<_> = model.search(vec![goal], &limits).collect();
    assert_eq!(sols.len(), 1);
    let (env, nota) = &sols[0];
    assert_eq!(writer::render(resolve(&Term::sym("#y"), env), nota), "x+1");
}

#[test]
fn test_search_budget_truncates() {
    let mut s = session();
    // Left-recursive rule: the search never terminates on its own.
    declare(
        &mut s,
        "\\operatorname{loop}(#x) \\dashv (\\operatorname{loop}(#x))",
    );
    s.processor.limits.max_search_steps = 50;
    let r = s.exec("goal! \\operatorname{loop}(a)").unwrap();
    assert_eq!(r.rendered, None);
    assert!(r
        .notices
        .iter()
        .any(|n| matches!(n, Notice::Info(m) if m.contains("budget"))));
}

#[test]
fn test_conjunction() {
    let mut s = session();
    declare(&mut s, "\\operatorname{boy}(a)");
    declare(&mut s, "\\operatorname{tall}(a)");
    declare(&mut s, "\\operatorname{boy}(b)");
    let r = s
        .exec("goal! (\\operatorname{boy}(#x), \\operatorname{tall}(#x))")
        .unwrap();
    assert_eq!(bindings_of(&r.notices), vec![vec![row("#x", "a")]]);
}
