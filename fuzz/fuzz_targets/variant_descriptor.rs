#![no_main]

use libfuzzer_sys::fuzz_target;
use stackcheck_harness::parse_descriptor;

fuzz_target!(|data: &[u8]| {
    // YAML 파서는 &str을 받으므로 UTF-8 변환 필요
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        if let Ok(variant) = parse_descriptor(yaml_str, "fuzz-input.yml") {
            // 검증을 통과한 디스크립터는 인자 렌더링과 목록 명령 분리도 성공해야 함
            let _ = variant.up_args();
            let _ = variant.down_args();
            assert!(variant.list_invocation().is_ok());
        }
    }
});
