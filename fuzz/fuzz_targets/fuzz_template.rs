#![no_main]
use arbitrary::Arbitrary;
use iam_match::iam::compile_template;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    template: String,
    candidate: String,
    open: u8,
    close: u8,
}

// Malformed templates must come back as errors, never panics
fuzz_target!(|input: Input| {
    if let Ok(compiled) = compile_template(&input.template, input.open, input.close) {
        let _ = compiled.is_match(&input.candidate);
    }
});
