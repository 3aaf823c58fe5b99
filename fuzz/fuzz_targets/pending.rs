#![no_main]

use libfuzzer_sys::fuzz_target;
use soap_proto::transport::http::HttpExchange;
use soap_proto::{CallConfig, PendingCall, SoapVersion};

// Prefixes that get the fuzzer past the HTTP prelude quickly.
const PRELUDES: &[&[u8]] = &[
    b"HTTP/1.1 200 OK\r\n\r\n",
    b"HTTP/1.1 500 Internal Server Error\r\n\r\n",
    b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n",
    b"HTTP/1.0 200 OK\r\nContent-Length: 64\r\n\r\n",
    b"",
];

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let version = if data[0] & 1 == 0 {
        SoapVersion::Soap11
    } else {
        SoapVersion::Soap12
    };

    let prelude = PRELUDES[(data[1] as usize) % PRELUDES.len()];

    // Feed in pieces of varying size.
    let split = (data[2] as usize).max(1);
    let input = &data[3..];

    let call = PendingCall::new(HttpExchange::new(), Vec::new(), CallConfig::new(version));

    call.with_exchange(|ex| {
        if ex.feed(prelude).is_err() {
            return;
        }
        for chunk in input.chunks(split) {
            if ex.feed(chunk).is_err() {
                return;
            }
        }
        ex.feed_eof();
    });

    assert!(call.is_finished());

    let message = call.return_message();
    let _ = call.return_headers();
    let _ = call.return_value();

    // Accessors are stable.
    assert_eq!(call.return_message(), message);
});
