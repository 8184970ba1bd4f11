#[test]
fn tzpass_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/tzpass_error_pass.rs");
}
