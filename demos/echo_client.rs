//! Framed echo client: connects to `echo_server` and exchanges a few
//! messages.
//!
//! Run with `cargo run --example echo_client`.

use foundry::prelude::*;
use std::time::Duration;

fn main() -> foundry::Result<()> {
    tracing_subscriber::fmt().init();

    let mut stream = FramedStream::connect("127.0.0.1:8989")?;
    println!("{}", stream.receive_text()?);

    for i in 0..5 {
        let message = format!("hello {}", i);
        stream.send_text(&message)?;
        println!("reply: {}", stream.receive_text()?);
        std::thread::sleep(Duration::from_millis(500));
    }

    stream.shutdown()?;
    Ok(())
}
