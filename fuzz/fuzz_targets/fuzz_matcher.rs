#![no_main]
use arbitrary::Arbitrary;
use iam_match::iam::PatternMatcher;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    candidate: String,
    patterns: String,
}

fuzz_target!(|input: Input| {
    let matcher = PatternMatcher::with_capacity(8);

    let first = matcher.matches(&input.candidate, &input.patterns);
    let second = matcher.matches(&input.candidate, &input.patterns);

    // Cached and uncached answers agree
    if let (Ok(a), Ok(b)) = (first, second) {
        assert_eq!(a, b);
    }

    // Literal lists reduce to string equality
    if !input.patterns.contains('*') && !input.patterns.contains(',') {
        if let Ok(matched) = matcher.matches(&input.candidate, &input.patterns) {
            assert_eq!(matched, input.candidate == input.patterns);
        }
    }
});
