#![no_main]
use arbitrary::Arbitrary;
use iam_match::evaluate_conditions;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    context: String,
    condition: String,
}

fuzz_target!(|input: Input| {
    let _ = evaluate_conditions(&input.context, &input.condition);
});
