#[test]
fn ui() {
    let t = trybuild::TestCases::new();
    // Passing cases
    t.pass("tests/ui/pass/*.rs");
}
