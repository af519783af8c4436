//! UDP transport for ICE, DTLS and SRTP packets.

use crate::error::{Result, WhipError};
use std::io;
use std::net::UdpSocket;

/// Size of the receive scratch buffer. This does not limit the size of sent
/// packets; the `pkt_size` option does.
pub const MAX_UDP_BUFFER_SIZE: usize = 4096;

/// A connected, non-blocking datagram socket towards the selected ICE
/// candidate. Sends and receives never block; an empty receive is `Ok(None)`.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind an ephemeral local port and connect to `host:port`.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect((host, port)).map_err(|e| {
            WhipError::Io(io::Error::new(
                e.kind(),
                format!("failed to connect udp://{host}:{port}: {e}"),
            ))
        })?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket })
    }

    /// Send one datagram to the connected peer.
    pub fn send(&self, buf: &[u8]) -> Result<()> {
        let written = self.socket.send(buf)?;
        if written != buf.len() {
            return Err(WhipError::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short UDP write: {written} of {} bytes", buf.len()),
            )));
        }
        Ok(())
    }

    /// Receive one datagram if available.
    ///
    /// Returns `Ok(None)` when the socket has nothing to read (EAGAIN).
    pub fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        match self.socket.recv(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The peer address this socket is connected to.
    pub fn peer_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.socket.peer_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_recv_on_loopback() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let peer_addr = peer.local_addr().unwrap();

        let transport = UdpTransport::connect("127.0.0.1", peer_addr.port()).unwrap();
        transport.send(b"ping").unwrap();

        let mut buf = [0u8; 16];
        let (n, from) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");

        peer.send_to(b"pong", from).unwrap();
        // Give the datagram a moment to arrive; the socket is non-blocking.
        let mut out = [0u8; MAX_UDP_BUFFER_SIZE];
        let mut got = None;
        for _ in 0..200 {
            if let Some(n) = transport.recv(&mut out).unwrap() {
                got = Some(n);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert_eq!(got, Some(4));
        assert_eq!(&out[..4], b"pong");
    }

    #[test]
    fn test_recv_eagain_is_none() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let transport =
            UdpTransport::connect("127.0.0.1", peer.local_addr().unwrap().port()).unwrap();
        let mut buf = [0u8; 64];
        assert!(transport.recv(&mut buf).unwrap().is_none());
    }
}
