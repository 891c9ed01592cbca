use core::fmt;

/// Bus transaction error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The device did not complete the transaction in time.
    Timeout { address: u8 },

    /// The device did not acknowledge its address or a data byte.
    Nack { address: u8 },

    /// The transfer returned a different number of bytes than requested.
    MalformedLength {
        address: u8,
        register: u8,
        expected: usize,
        actual: usize,
    },

    /// Any other driver-level failure.
    Transfer { address: u8, details: String },
}

/// Implementation of the `Display` trait for `BusError`.
impl fmt::Display for BusError {
    /// Format the error message.
    ///
    /// # Arguments
    /// * `f` - The formatter to write the error message to.
    ///
    /// # Returns
    /// * `fmt::Result` - The result of the formatting operation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Timeout { address } => {
                write!(f, "Bus timeout talking to device 0x{address:02x}")
            }
            BusError::Nack { address } => {
                write!(f, "Device 0x{address:02x} did not acknowledge")
            }
            BusError::MalformedLength {
                address,
                register,
                expected,
                actual,
            } => write!(
                f,
                "Malformed read from 0x{address:02x} register 0x{register:02x}: expected {expected} bytes, got {actual}"
            ),
            BusError::Transfer { address, details } => {
                write!(f, "Transfer with 0x{address:02x} failed: {details}")
            }
        }
    }
}

/// Implementation of the `Error` trait for `BusError`.
impl std::error::Error for BusError {}

/// Register value that could not be turned into a reading.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The air-quality sensor is not in the operating mode we armed it with.
    UnexpectedOpMode { expected: u8, actual: u8 },

    /// The device reports an internal error in its status register.
    DeviceFault { status: u8 },

    /// The chip identification register holds an unexpected value.
    UnexpectedChipId { expected: u8, actual: u8 },

    /// A decoded quantity is outside the physically possible range.
    OutOfRange { quantity: &'static str, value: f32 },
}

/// Implementation of the `Display` trait for `DecodeError`.
impl fmt::Display for DecodeError {
    /// Format the error message.
    ///
    /// # Arguments
    /// * `f` - The formatter to write the error message to.
    ///
    /// # Returns
    /// * `fmt::Result` - The result of the formatting operation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnexpectedOpMode { expected, actual } => write!(
                f,
                "Unexpected operating mode: expected 0x{expected:02x}, got 0x{actual:02x}"
            ),
            DecodeError::DeviceFault { status } => {
                write!(f, "Device reports an error, status 0x{status:02x}")
            }
            DecodeError::UnexpectedChipId { expected, actual } => write!(
                f,
                "Unexpected chip id: expected 0x{expected:02x}, got 0x{actual:02x}"
            ),
            DecodeError::OutOfRange { quantity, value } => {
                write!(f, "{quantity} out of range: {value}")
            }
        }
    }
}

/// Implementation of the `Error` trait for `DecodeError`.
impl std::error::Error for DecodeError {}

/// Sensor error, either on the wire or while decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// Bus error.
    Bus(BusError),

    /// Decode error.
    Decode(DecodeError),
}

/// Implementation of the `From` trait for `SensorError`.
impl From<BusError> for SensorError {
    /// Wrap a bus error.
    fn from(error: BusError) -> Self {
        SensorError::Bus(error)
    }
}

/// Implementation of the `From` trait for `SensorError`.
impl From<DecodeError> for SensorError {
    /// Wrap a decode error.
    fn from(error: DecodeError) -> Self {
        SensorError::Decode(error)
    }
}

/// Implementation of the `Display` trait for `SensorError`.
impl fmt::Display for SensorError {
    /// Format the error message.
    ///
    /// # Arguments
    /// * `f` - The formatter to write the error message to.
    ///
    /// # Returns
    /// * `fmt::Result` - The result of the formatting operation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Bus(e) => write!(f, "Bus error: {e}"),
            SensorError::Decode(e) => write!(f, "Decode error: {e}"),
        }
    }
}

/// Implementation of the `Error` trait for `SensorError`.
impl std::error::Error for SensorError {
    /// The wrapped bus or decode error.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SensorError::Bus(e) => Some(e),
            SensorError::Decode(e) => Some(e),
        }
    }
}

/// Display surface error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// The display did not accept a command or data transfer.
    Bus(BusError),

    /// Any other driver failure, such as the reset line.
    Driver(String),
}

/// Implementation of the `From` trait for `DisplayError`.
impl From<BusError> for DisplayError {
    /// Wrap a bus error.
    fn from(error: BusError) -> Self {
        DisplayError::Bus(error)
    }
}

/// Implementation of the `Display` trait for `DisplayError`.
impl fmt::Display for DisplayError {
    /// Format the error message.
    ///
    /// # Arguments
    /// * `f` - The formatter to write the error message to.
    ///
    /// # Returns
    /// * `fmt::Result` - The result of the formatting operation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Bus(e) => write!(f, "Display bus error: {e}"),
            DisplayError::Driver(msg) => write!(f, "Display driver error: {msg}"),
        }
    }
}

/// Implementation of the `Error` trait for `DisplayError`.
impl std::error::Error for DisplayError {}
