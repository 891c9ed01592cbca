//! Register-level access to the shared I2C bus.

use crate::error::BusError;

/// Largest single transfer any station device needs.
pub const MAX_TRANSFER: usize = 32;

/// Bytes returned by a bus read.
pub type Bytes = heapless::Vec<u8, MAX_TRANSFER>;

/// Synchronous bus transport.
///
/// Each call is one complete transaction and blocks until it finishes or the
/// driver times out. Implementations are handed to one device at a time, so
/// transactions from different devices never interleave.
pub trait BusTransport {
    /// Read `len` bytes starting at `register` of the device at `address`.
    fn read(&mut self, address: u8, register: u8, len: usize) -> Result<Bytes, BusError>;

    /// Write a single `value` to `register` of the device at `address`.
    fn write(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError>;

    /// Send a bare command byte to a device without register addressing.
    fn command(&mut self, address: u8, command: u8) -> Result<(), BusError>;

    /// Read `len` bytes from a device without register addressing.
    fn receive(&mut self, address: u8, len: usize) -> Result<Bytes, BusError>;
}

/// Read exactly `N` bytes from a register, rejecting short or long replies.
///
/// # Arguments
/// * `bus` - The bus to read from.
/// * `address` - The device address.
/// * `register` - The first register to read.
///
/// # Returns
/// * `Result<[u8; N], BusError>` - The register contents or an error.
pub fn read_exact<B: BusTransport + ?Sized, const N: usize>(
    bus: &mut B,
    address: u8,
    register: u8,
) -> Result<[u8; N], BusError> {
    let bytes = bus.read(address, register, N)?;

    if bytes.len() != N {
        return Err(BusError::MalformedLength {
            address,
            register,
            expected: N,
            actual: bytes.len(),
        });
    }

    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);

    Ok(out)
}

/// Read a single register byte.
pub fn read_byte<B: BusTransport + ?Sized>(
    bus: &mut B,
    address: u8,
    register: u8,
) -> Result<u8, BusError> {
    read_exact::<B, 1>(bus, address, register).map(|[byte]| byte)
}

/// Allocate a zero-filled receive buffer of `len` bytes.
///
/// # Arguments
/// * `address` - The device the transfer is for.
/// * `len` - The number of bytes to receive.
///
/// # Returns
/// * `Result<Bytes, BusError>` - The buffer, or `Transfer` if `len` exceeds
///   [`MAX_TRANSFER`]. Nothing has been sent at that point.
pub fn receive_buffer(address: u8, len: usize) -> Result<Bytes, BusError> {
    let mut buffer = Bytes::new();

    buffer.resize(len, 0).map_err(|_| BusError::Transfer {
        address,
        details: format!("request of {len} bytes exceeds the {MAX_TRANSFER} byte transfer limit"),
    })?;

    Ok(buffer)
}

/// Combine a little-endian register pair into a 16-bit total.
pub fn decode_u16(lsb: u8, msb: u8) -> u16 {
    u16::from(msb) * 256 + u16::from(lsb)
}

/// Tests.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBus;
    use proptest::prelude::*;

    #[test]
    fn decode_u16_combines_high_and_low() {
        assert_eq!(decode_u16(0x2c, 0x01), 300);
        assert_eq!(decode_u16(0xff, 0xff), u16::MAX);
        assert_eq!(decode_u16(0, 0), 0);
    }

    proptest! {
        #[test]
        fn decode_u16_is_msb_times_256_plus_lsb(lsb in any::<u8>(), msb in any::<u8>()) {
            prop_assert_eq!(
                u32::from(decode_u16(lsb, msb)),
                u32::from(msb) * 256 + u32::from(lsb)
            );
        }
    }

    #[test]
    fn read_exact_rejects_short_reply() {
        let mut bus = MockBus::new();
        bus.set_reply_len(0x53, 0x22, 0);

        assert_eq!(
            read_byte(&mut bus, 0x53, 0x22),
            Err(BusError::MalformedLength {
                address: 0x53,
                register: 0x22,
                expected: 1,
                actual: 0,
            })
        );
    }

    #[test]
    fn receive_buffer_is_zeroed() {
        let buffer = receive_buffer(0x23, 2).unwrap();

        assert_eq!(buffer.as_slice(), &[0, 0]);
    }

    #[test]
    fn receive_buffer_rejects_oversized_request() {
        match receive_buffer(0x3c, MAX_TRANSFER + 1) {
            Err(BusError::Transfer { address, details }) => {
                assert_eq!(address, 0x3c);
                assert!(details.contains("exceeds the 32 byte transfer limit"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn read_exact_returns_consecutive_registers() {
        let mut bus = MockBus::new();
        bus.set_register(0x76, 0xf7, 0x51);
        bus.set_register(0x76, 0xf8, 0x52);

        assert_eq!(read_exact::<_, 2>(&mut bus, 0x76, 0xf7), Ok([0x51, 0x52]));
    }
}
