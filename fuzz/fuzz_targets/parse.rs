#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // No stage may panic, whatever the earlier ones accepted.
        if let Ok(ast) = doty_parser::parse(s) {
            if let Ok(bindings) = doty_names::resolve(&ast) {
                let _ = doty_typeck::check(&ast, &bindings);
            }
        }
    }
});
