#![no_main]

use libfuzzer_sys::fuzz_target;
use stackcheck_harness::{json_response, parse_response};

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data) {
        if let Ok(parsed) = parse_response(body) {
            // 다시 직렬화한 응답 라인은 같은 값으로 파싱되어야 함
            let line = json_response(&parsed.response);
            let reparsed = parse_response(&line).expect("re-encoded line must parse");
            assert_eq!(reparsed.response, parsed.response);
        }
    }
});
