//! Framed echo server: one pool task per client connection.
//!
//! Run with `cargo run --example echo_server`, then connect one or more
//! `echo_client` processes.

use foundry::prelude::*;
use std::sync::Arc;

fn serve_client(mut stream: FramedStream, logger: Arc<Logger>) {
    let peer = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(_) => "unknown".to_string(),
    };
    logger.log(format!("serving {}", peer));

    loop {
        match stream.receive_text() {
            Ok(request) => {
                logger.log(format!("{} -> {}", peer, request));
                if stream.send_text(&format!("echo: {}", request)).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }

    logger.log(format!("{} disconnected", peer));
}

fn main() -> foundry::Result<()> {
    tracing_subscriber::fmt().init();

    let pool = ThreadPool::new(4)?;
    let logger = Arc::new(Logger::new("log")?);

    let listener = FrameListener::bind("127.0.0.1:8989")?;
    println!("listening on {}", listener.local_addr()?);

    loop {
        let (mut stream, addr) = listener.accept()?;
        println!("accepted {}", addr);
        stream.send_text("connected to the echo pool")?;

        let logger = logger.clone();
        pool.submit(move || serve_client(stream, logger))?;
    }
}
