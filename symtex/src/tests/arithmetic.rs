use crate::limits::ResourceLimits;
use crate::session::Session;

fn session() -> Session {
    Session::new(ResourceLimits::default()).unwrap()
}

fn eval(s: &mut Session, input: &str) -> String {
    s.exec(input).unwrap().rendered.unwrap()
}

#[test]
fn test_integer_sum() {
    let mut s = session();
    assert_eq!(eval(&mut s, "2+3"), "5");
    assert_eq!(eval(&mut s, "2+3-1"), "4");
}

#[test]
fn test_integer_product() {
    let mut s = session();
    assert_eq!(eval(&mut s, "2 2"), "4");
    assert_eq!(eval(&mut s, "2 3 x"), "6 x");
}

#[test]
fn test_fraction_arithmetic() {
    let mut s = session();
    assert_eq!(eval(&mut s, "\\frac{1}{2}+\\frac{1}{4}"), "\\frac{3}{4}");
    assert_eq!(eval(&mut s, "\\frac{4}{2}"), "2");
    assert_eq!(eval(&mut s, "1 \\frac{1}{2}"), "\\frac{3}{2}");
}

#[test]
fn test_like_terms_collect() {
    let mut s = session();
    assert_eq!(eval(&mut s, "x+x"), "2 x");
    assert_eq!(eval(&mut s, "2 x+3 x"), "5 x");
    assert_eq!(
        eval(&mut s, "\\frac 2 3 x + \\frac 1 5 x"),
        "\\frac{13}{15}x"
    );
}

#[test]
fn test_cancellation() {
    let mut s = session();
    assert_eq!(eval(&mut s, "x - x"), "0");
    assert_eq!(eval(&mut s, "2 x-2 x"), "0");
}

#[test]
fn test_powers() {
    let mut s = session();
    assert_eq!(eval(&mut s, "2^3"), "8");
    assert_eq!(eval(&mut s, "x^0"), "1");
    assert_eq!(eval(&mut s, "x^1"), "x");
}

#[test]
fn test_equal_factors_merge() {
    let mut s = session();
    assert_eq!(eval(&mut s, "x x"), "x^2");
    assert_eq!(eval(&mut s, "(x+1)(x+1)"), "(x+1)^2");
}

#[test]
fn test_function_application_is_left_alone() {
    let mut s = session();
    assert_eq!(eval(&mut s, "\\sin x"), "\\sin x");
}

#[test]
fn test_symbolic_sum_stays() {
    let mut s = session();
    assert_eq!(eval(&mut s, "x+y"), "x+y");
}

#[test]
fn test_add_command_flattens() {
    let mut s = session();
    assert_eq!(eval(&mut s, "add! (x+(y+z))"), "x+y+z");
}

#[test]
fn test_mulex_expands_product() {
    let mut s = session();
    assert_eq!(eval(&mut s, "mulex! (x+1)(x+2)"), "x^2+3 x+2");
}

#[test]
fn test_mulex_difference_of_squares() {
    let mut s = session();
    assert_eq!(eval(&mut s, "mulex! (x+1)(x-1)"), "x^2-1");
}
