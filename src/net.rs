//! Length-prefixed TCP framing.
//!
//! Every message on the wire is a 4-byte big-endian payload length followed
//! by the payload bytes, so a receiver always knows where one message ends
//! and the next begins. Calls block; they are meant to run inside submitted
//! pool tasks.

use crate::error::Result;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

/// A connected TCP stream speaking the length-prefixed frame protocol.
#[derive(Debug)]
pub struct FramedStream {
    stream: TcpStream,
}

impl FramedStream {
    /// Connect to a remote peer.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Ok(Self { stream })
    }

    /// Wrap an already-accepted stream.
    pub fn from_stream(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Send one framed message: 4-byte big-endian length, then the payload.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        let len = payload.len() as u32;
        self.stream.write_all(&len.to_be_bytes())?;
        self.stream.write_all(payload)?;
        Ok(())
    }

    pub fn send_text(&mut self, message: &str) -> Result<()> {
        self.send(message.as_bytes())
    }

    /// Receive one framed message, blocking until the full payload arrived.
    pub fn receive(&mut self) -> Result<Vec<u8>> {
        let mut header = [0u8; 4];
        self.stream.read_exact(&mut header)?;
        let len = u32::from_be_bytes(header) as usize;

        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload)?;
        Ok(payload)
    }

    pub fn receive_text(&mut self) -> Result<String> {
        let payload = self.receive()?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }

    /// Shut down both directions. Further sends and receives fail.
    pub fn shutdown(&self) -> Result<()> {
        self.stream.shutdown(Shutdown::Both)?;
        Ok(())
    }
}

/// Listening socket handing out [`FramedStream`]s.
#[derive(Debug)]
pub struct FrameListener {
    listener: TcpListener,
}

impl FrameListener {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self { listener })
    }

    /// Block until a client connects.
    pub fn accept(&self) -> Result<(FramedStream, SocketAddr)> {
        let (stream, addr) = self.listener.accept()?;
        Ok((FramedStream::from_stream(stream), addr))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_framed_round_trip() {
        let listener = FrameListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = stream.receive().unwrap();
            stream.send(&request).unwrap();
        });

        let mut client = FramedStream::connect(addr).unwrap();
        client.send(b"ping over the wire").unwrap();
        assert_eq!(client.receive().unwrap(), b"ping over the wire");

        server.join().unwrap();
    }

    #[test]
    fn test_empty_payload_frame() {
        let listener = FrameListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            assert!(stream.receive().unwrap().is_empty());
            stream.send_text("ack").unwrap();
        });

        let mut client = FramedStream::connect(addr).unwrap();
        client.send(b"").unwrap();
        assert_eq!(client.receive_text().unwrap(), "ack");

        server.join().unwrap();
    }

    #[test]
    fn test_messages_do_not_coalesce() {
        // Two back-to-back sends must come out as two distinct frames.
        let listener = FrameListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let first = stream.receive_text().unwrap();
            let second = stream.receive_text().unwrap();
            stream.send_text(&format!("{}|{}", first, second)).unwrap();
        });

        let mut client = FramedStream::connect(addr).unwrap();
        client.send_text("alpha").unwrap();
        client.send_text("beta").unwrap();
        assert_eq!(client.receive_text().unwrap(), "alpha|beta");

        server.join().unwrap();
    }
}
