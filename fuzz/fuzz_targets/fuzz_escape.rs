#![no_main]

use envlit::transform::{escape_quoted, escape_raw};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // === Quoted escaping - should never panic ===
    let once = escape_quoted(data);

    // === Idempotence: a second pass must be a no-op ===
    let twice = escape_quoted(&once);
    assert_eq!(once, twice);

    // === Raw-string wrapping - should never panic ===
    let wrapped = escape_raw(data);

    // === The delimiter must outrun every quote run in the input ===
    let longest_run = data.split(|c| c != '"').map(str::len).max().unwrap_or(0);
    let delim_len = wrapped.chars().take_while(|&c| c == '"').count();
    assert!(delim_len >= 3);
    assert!(delim_len > longest_run);
});
