#![no_main]

use libfuzzer_sys::fuzz_target;
use stackcheck_target::udp::parse_datagram;

fuzz_target!(|data: &[u8]| {
    let _ = parse_datagram(data);
});
