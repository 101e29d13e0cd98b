use crate::limits::ResourceLimits;
use crate::response::Notice;
use crate::session::Session;
use crate::SymtexError;

fn session() -> Session {
    Session::new(ResourceLimits::default()).unwrap()
}

#[test]
fn test_execution_indices() {
    let mut s = session();
    assert_eq!(s.exec("1+1").unwrap().index, 1);
    assert_eq!(s.exec("2+2").unwrap().index, 2);
    assert_eq!(s.history_len(), 2);
}

#[test]
fn test_parse_error_does_not_consume_index() {
    let mut s = session();
    assert!(s.exec("2+").is_err());
    assert_eq!(s.history_len(), 0);
    assert_eq!(s.exec("1").unwrap().index, 1);
}

#[test]
fn test_echo_toggle() {
    let mut s = session();
    let r = s.exec("echo-on!").unwrap();
    assert_eq!(r.rendered, None);
    assert_eq!(
        s.exec("1+1").unwrap().rendered.as_deref(),
        Some("1+1 \\Rightarrow 2")
    );
    s.exec("echo-off!").unwrap();
    assert_eq!(s.exec("1+1").unwrap().rendered.as_deref(), Some("2"));
}

#[test]
fn test_backref_substitutes_history() {
    let mut s = session();
    assert_eq!(s.exec("2+3").unwrap().rendered.as_deref(), Some("5"));
    assert_eq!(s.exec("[[1]]+1").unwrap().rendered.as_deref(), Some("6"));
    // Negative indices count back from the latest execution.
    assert_eq!(s.exec("[[-1]] x").unwrap().rendered.as_deref(), Some("6 x"));
}

#[test]
fn test_backref_out_of_range() {
    let mut s = session();
    assert!(matches!(s.exec("[[3]]"), Err(SymtexError::Engine(_))));
}

#[test]
fn test_clear_resets_session() {
    let mut s = session();
    s.exec("\\operatorname{boy}(a)").unwrap();
    s.exec("1+1").unwrap();
    let r = s.exec("clear!").unwrap();
    assert_eq!(r.rendered, None);
    assert_eq!(s.history_len(), 0);
    assert!(s.processor.model.is_empty());
    assert_eq!(s.exec("1").unwrap().index, 1);
}

#[test]
fn test_match_reports_bindings() {
    let mut s = session();
    let r = s.exec("match![n,x] 3+y \\Box n+x").unwrap();
    assert_eq!(
        r.rendered.as_deref(),
        Some("match![n,x] 3+y \\Box n+x \\Rightarrow \\textit{true}")
    );
    assert_eq!(
        r.notices,
        vec![Notice::Bindings(vec![
            ("n".to_string(), "3".to_string()),
            ("x".to_string(), "y".to_string()),
        ])]
    );
}

#[test]
fn test_match_failure() {
    let mut s = session();
    let r = s.exec("match![n] x+y \\Box n").unwrap();
    assert_eq!(
        r.rendered.as_deref(),
        Some("match![n] x+y \\Box n \\Rightarrow \\textit{false}")
    );
    assert!(r.notices.is_empty());
}

#[test]
fn test_match_collects_ellipsis_run() {
    let mut s = session();
    let r = s.exec("match![a] x+y+z \\Box a+...").unwrap();
    assert_eq!(
        r.rendered.as_deref(),
        Some("match![a] x+y+z \\Box a+... \\Rightarrow \\textit{true}")
    );
    assert_eq!(
        r.notices,
        vec![Notice::Bindings(vec![("a".to_string(), "x,y,z".to_string())])]
    );
}

#[test]
fn test_echo_once_only_applies_once() {
    let mut s = session();
    s.exec("match![n] 3 \\Box n").unwrap();
    assert_eq!(s.exec("1+1").unwrap().rendered.as_deref(), Some("2"));
}

#[test]
fn test_track_emits_pass_trace() {
    let mut s = session();
    let r = s.exec("track! (2+3)").unwrap();
    assert_eq!(
        r.rendered.as_deref(),
        Some("track! (2+3) \\Rightarrow 5")
    );
    assert!(r
        .notices
        .iter()
        .any(|n| matches!(n, Notice::Trace { pass: 1, formula } if formula == "5")));
    // Tracking does not leak into the next execution.
    assert!(s.exec("1+1").unwrap().notices.is_empty());
}

#[test]
fn test_rules_command_lists_database() {
    let mut s = session();
    s.exec("\\operatorname{boy}(a)").unwrap();
    s.exec("\\operatorname{child}(#x) \\dashv (\\operatorname{boy}(#x))")
        .unwrap();
    let r = s.exec("rules!").unwrap();
    assert_eq!(r.rendered, None);
    assert_eq!(
        r.notices,
        vec![
            Notice::Formula("\\operatorname{boy}(a)".to_string()),
            Notice::Formula(
                "\\operatorname{child}(#x) \\dashv \\operatorname{boy}(#x)".to_string()
            ),
            Notice::Info("2 rule(s) in database".to_string()),
        ]
    );
}

#[test]
fn test_dump_lists_graph_entries() {
    let mut s = session();
    let r = s.exec("dump! x+1").unwrap();
    assert_eq!(r.rendered.as_deref(), Some("x+1"));
    assert!(r.notices.iter().any(|n| matches!(n, Notice::Info(_))));
}

#[test]
fn test_closure_defers_evaluation() {
    let mut s = session();
    let r = s.exec("closure! x+x").unwrap();
    assert_eq!(r.rendered.as_deref(), Some("closure!x+x"));
}

#[test]
fn test_unknown_command() {
    let mut s = session();
    let err = s.exec("bogus! x").unwrap_err();
    assert_eq!(err, SymtexError::unknown_command("bogus"));
}

#[test]
fn test_command_arity_error() {
    let mut s = session();
    let err = s.exec("match! x").unwrap_err();
    assert_eq!(err, SymtexError::command_usage("match", 2, 1));
}

#[test]
fn test_attrs_rejected_where_unsupported() {
    let mut s = session();
    assert!(matches!(
        s.exec("goal![x] \\operatorname{boy}(a)"),
        Err(SymtexError::Engine(_))
    ));
}

#[test]
fn test_none_sentinel_suppresses_output() {
    let mut s = session();
    let r = s.exec("\\none").unwrap();
    assert_eq!(r.rendered, None);
}
