use symtex::{Notice, ResourceLimits, Session};

#[test]
fn test_end_to_end_arithmetic() {
    let mut session = Session::new(ResourceLimits::default()).unwrap();

    let r = session.exec("2 x+3 x").unwrap();
    assert_eq!(r.rendered.as_deref(), Some("5 x"));

    let r = session.exec("\\frac 2 3 x + \\frac 1 5 x").unwrap();
    assert_eq!(r.rendered.as_deref(), Some("\\frac{13}{15}x"));
}

#[test]
fn test_end_to_end_resolution() {
    let mut session = Session::new(ResourceLimits::default()).unwrap();

    session.exec("\\operatorname{boy}(a)").unwrap();
    session.exec("\\operatorname{boy}(b)").unwrap();
    session
        .exec("\\operatorname{child}(#x) \\dashv (\\operatorname{boy}(#x))")
        .unwrap();

    let r = session.exec("goal! \\operatorname{child}(#w)").unwrap();
    assert_eq!(r.rendered.as_deref(), Some("\\textit{True}"));
    let rows: Vec<_> = r
        .notices
        .iter()
        .filter_map(|n| match n {
            Notice::Bindings(rows) => Some(rows.clone()),
            _ => None,
        })
        .collect();
    // Clauses are tried most-recently-declared first.
    assert_eq!(
        rows,
        vec![
            vec![("#w".to_string(), "b".to_string())],
            vec![("#w".to_string(), "a".to_string())],
        ]
    );
}

#[test]
fn test_end_to_end_match_command() {
    let mut session = Session::new(ResourceLimits::default()).unwrap();

    let r = session.exec("match![n] 2+x \\Box n+x").unwrap();
    assert_eq!(
        r.rendered.as_deref(),
        Some("match![n] 2+x \\Box n+x \\Rightarrow \\textit{true}")
    );
    assert_eq!(
        r.notices,
        vec![Notice::Bindings(vec![("n".to_string(), "2".to_string())])]
    );
}

#[test]
fn test_end_to_end_back_reference() {
    let mut session = Session::new(ResourceLimits::default()).unwrap();

    assert_eq!(session.exec("2+3").unwrap().rendered.as_deref(), Some("5"));
    assert_eq!(
        session.exec("[[1]] x").unwrap().rendered.as_deref(),
        Some("5 x")
    );
}
