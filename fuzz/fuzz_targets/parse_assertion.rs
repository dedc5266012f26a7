#![no_main]

// Harness: parse_assertion
// Focus: the path:flag parsing helper never panics, and whatever it accepts
// renders back to an equal assertion.

use libfuzzer_sys::fuzz_target;
use sledge_perms::Assertion;

fuzz_target!(|text: &str| {
    if let Ok(a) = Assertion::parse(text) {
        let again = Assertion::parse(&a.to_string()).expect("rendered form must parse");
        assert_eq!(again, a);
        assert!(!a.path().is_empty());
    }
});
