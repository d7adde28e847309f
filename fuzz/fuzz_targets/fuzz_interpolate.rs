#![no_main]

use envlit::transform::interpolate;
use envlit::SourceMap;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let map: SourceMap = [("HOST", "example.com"), ("PORT", "8080")]
        .into_iter()
        .collect();

    // === Interpolation - should never panic, in any flag combination ===
    for constant_case in [false, true] {
        for optional in [false, true] {
            let (out, _faults) = interpolate(data, &map, constant_case, optional);

            // A second pass over the output must not panic either.
            let _ = interpolate(&out, &map, constant_case, optional);
        }
    }
});
