// skid Copyright (c) 2026 skid contributors.
// Licensed under the MIT License.
// See LICENSE file in repository root for complete license text.

use core::fmt;
use gpio::GpioOut;
use std::{
    error::Error,
    mem,
    sync::mpsc::{self, SendError, Sender},
    thread,
    time::Duration,
};

/// Responsible for sending out commands to devices on the serial bus. The bus
/// on this robot is send-only, none of the devices on it report back.
pub struct Client {
    tx: Sender<SerialData>,
}

impl Client {
    /// Creates a new `Client` given already opened `GpioOut` implementations.
    pub fn new<T>(clock: T, data: T, cycle: Duration) -> Self
    where
        T: GpioOut + Send + 'static,
        <T as GpioOut>::Error: Send,
    {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || -> Result<(), T::Error> {
            let mut sender = BitSender::new(clock, data, cycle);

            loop {
                let packet: SerialData = match rx.recv() {
                    Ok(p) => p,

                    // Returning here makes it so that when the transmitter,
                    // and therefore its containing struct is dropped, so too
                    // does this thread return, which in this case is not
                    // actually an error.
                    Err(_) => return Ok(()),
                };

                sender.send(packet)?;
            }
        });

        Self { tx }
    }

    /// Queues a packet for sending on the client thread. Returns the given
    /// packet's head on success. An `Err` value from this function means that
    /// the `Client` instance's thread has returned with an error. An `Ok`
    /// variant does not necessarily mean the given `Packet` was successfully
    /// sent over serial, only that it was queued for that purpose.
    #[inline]
    pub fn send<U, V>(&mut self, packet: Packet<U, V>) -> Result<U, SendError<SerialData>>
    where
        U: Header,
        V: Data,
    {
        self.tx.send(packet.into())?;
        Ok(packet.head)
    }
}

/// Sends binary data not exceeding 64 bits over the serial bus.
///
/// While the clock pin is high no device should read bits, when clock is low
/// the `BitSender` will not change the value of the data pin and it may be
/// read. While not sending data the `BitSender` will set clock high and data
/// will be held at low, if data moves up while clock is up it will signal the
/// start of a new packet.
pub struct BitSender<T: GpioOut> {
    clock: T,
    data: T,
    cycle: Duration,
}

impl<T: GpioOut> BitSender<T> {
    /// Creates a new `BitSender` from already open `GpioOut` implementations.
    pub fn new(clock: T, data: T, cycle: Duration) -> Self {
        Self { clock, data, cycle }
    }

    /// Puts pins in their default "waiting" state, should be preformed after
    /// construction in most cases.
    pub fn start(&mut self) -> Result<(), T::Error> {
        self.clock.set_high()?;
        self.data.set_low()?;
        Ok(())
    }

    /// Sends the binary representation of the given data. Returns the number
    /// of bits sent.
    pub fn send(&mut self, data: SerialData) -> Result<u8, T::Error> {
        let (bits, bits_length) = data;

        self.start()?;

        // Signal data begin with both pins high.
        self.clock.set_high()?;
        self.data.set_high()?;

        thread::sleep(self.cycle);

        for i in 0..bits_length {
            let bit = bits << i & (1 << bits_length - 1) != 0;

            // Set data pin to our bit and lower clock pin to allow reading.
            self.data.set_value(bit)?;
            self.clock.set_low()?;

            thread::sleep(self.cycle);
            self.clock.set_high()?;
            thread::sleep(self.cycle);
        }

        // Go back to waiting and return.
        self.start()?;
        Ok(bits_length)
    }
}

/// Represents a single addressed packet for the serial bus where `T` is the
/// implementation of `Header` being used, likewise `U` is the implementation
/// of `Data` being used.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Packet<T, U>
where
    T: Header,
    U: Data,
{
    pub head: T,
    pub data: U,
}

impl<T, U> Packet<T, U>
where
    T: Header,
    U: Data,
{
    /// Number of bits in each packet as sent over serial, does not reflect
    /// actual size in computer memory which is made different by alignment
    /// and any implementation details of the implementations of `Header` and
    /// `Data` being used.
    pub const BITS: u32 = (mem::size_of::<u8>() * 2 * 8) as u32 + u32::BITS;

    /// Creates a new packet given a `Header` and `Data`.
    #[inline]
    #[must_use]
    pub const fn new(head: T, data: U) -> Self {
        Self { head, data }
    }

    /// Gets the generic integer representation of the packet.
    #[inline]
    #[must_use]
    pub fn get(self) -> Packet<(u8, u8), u32> {
        Packet::<(u8, u8), u32> {
            head: self.head.get(),
            data: self.data.get(),
        }
    }

    /// Parses the given `SerialData` into a `Packet<(u8, u8), u32>`. If you
    /// are looking to get a packet with a specific implementation of `Header`
    /// and `Data` see `Packet::<T, U>::try_from()`.
    pub fn parse((v, _): SerialData) -> Packet<(u8, u8), u32> {
        let addr = (v >> (u8::BITS + u32::BITS)) as u8;
        let cmd = (v >> u32::BITS) as u8;
        let data = v as u32;

        Packet::new((addr, cmd), data)
    }
}

impl<T, U> TryFrom<SerialData> for Packet<T, U>
where
    T: Header,
    U: Data,
{
    type Error = ExtractionError;

    /// Assembles a `Packet<T, U>` where `T` and `U` are the specified
    /// implementations of `Header` and `Data` respectively.
    fn try_from(value: SerialData) -> ExtractionResult<Self> {
        let (_, size) = value;

        if size != Self::BITS as u8 {
            return Err(ExtractionError);
        }

        let packet = Self::parse(value);

        Ok(Self {
            head: T::extract(&packet)?,
            data: U::extract(&packet)?,
        })
    }
}

impl<T, U> From<Packet<T, U>> for SerialData
where
    T: Header,
    U: Data,
{
    /// Every produced `SerialData` has a second value equal to
    /// `Packet::<(u8, u8), u32>::BITS`.
    fn from(packet: Packet<T, U>) -> SerialData {
        let data = packet.data.get() as u64;
        let head = packet.head.get_shifted();

        (head | data, Packet::<T, U>::BITS as u8)
    }
}

/// Result from extracting either `Header` or `Data` from a
/// `Packet<(u8, u8), u32>`.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Error from extracting either `Header` or `Data` from a
/// `Packet<(u8, u8), u32>`.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionError;

impl Error for ExtractionError {}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error extracting either header or data from packet")
    }
}

impl Header for (u8, u8) {
    fn extract<T, U>(packet: &Packet<T, U>) -> ExtractionResult<Self>
    where
        T: Header,
        U: Data,
    {
        Ok(packet.head.get())
    }

    fn get(&self) -> Self {
        *self
    }
}

impl Data for u32 {
    fn extract<T, U>(packet: &Packet<T, U>) -> ExtractionResult<Self>
    where
        T: Header,
        U: Data,
    {
        Ok(packet.data.get())
    }

    fn get(&self) -> u32 {
        *self
    }
}

impl Data for f32 {
    fn extract<T, U>(packet: &Packet<T, U>) -> ExtractionResult<Self>
    where
        T: Header,
        U: Data,
    {
        Ok(f32::from_bits(packet.data.get()))
    }

    fn get(&self) -> u32 {
        self.to_bits()
    }
}

/// Trait for representing a packet tag, used for distinguishing different
/// commands and for addressing data to a specific device. Should be
/// convertable to and from a `(u8, u8)`, the first integer being the address
/// and second being the command.
pub trait Header: Clone + Copy {
    /// The number of bits taken up by any header's address and command.
    const BITS: u32 = u8::BITS * 2;

    /// Construct a new `Header` instance given the packet it belongs to. An
    /// `Err` variant means that the given packet contained an invalid header.
    #[must_use]
    fn extract<T, U>(packet: &Packet<T, U>) -> ExtractionResult<Self>
    where
        T: Header,
        U: Data;

    /// Get the binary representation of this `Header`'s address and command,
    /// in that order.
    ///
    /// The address of the tag will be checked by all devices on the bus and
    /// be used to determine which device should utilise the rest of the
    /// packet. The command instructs the device on how to utilize the
    /// packet's data.
    #[must_use]
    fn get(&self) -> (u8, u8);

    /// Like `Header::get()` but returns the values shifted to their
    /// appropriate place in a single `u64` for sending over serial.
    #[inline]
    #[must_use]
    fn get_shifted(&self) -> u64 {
        let (addr, cmd) = self.get();
        ((addr as u64) << (u8::BITS + u32::BITS)) | ((cmd as u64) << u32::BITS)
    }
}

/// Represents the data of a packet sent over the serial bus. Must be fully
/// convertable to a 32 bit unsigned integer (even if the interpretation of
/// such is non-sensical), this means that whatever data is contained in the
/// implementer should be stored within 32 bits.
pub trait Data: Clone + Copy {
    /// Construct a new `Data` instance given the packet it belongs to. An
    /// `Err` variant means the given packet was invalid.
    fn extract<T, U>(packet: &Packet<T, U>) -> ExtractionResult<Self>
    where
        T: Header,
        U: Data;

    fn get(&self) -> u32;
}

/// Represents a binary representation of data that can be sent via serial.
pub type SerialData = (u64, u8);

/// Fake `GpioOut` for testing, a custom one rather than `DummyGpioOut`
/// because the provided one does not work very well over threads.
pub struct TestGpioOut {
    tx: Sender<gpio::GpioValue>,
}

impl TestGpioOut {
    /// Creates a new test output gpio pin.
    ///
    /// # Arguments
    ///
    /// * `tx` - An `mpsc::Sender<GpioValue>` linked to a receiver which
    /// records the pin's level changes.
    pub fn new(tx: Sender<gpio::GpioValue>) -> Self {
        Self { tx }
    }
}

impl GpioOut for TestGpioOut {
    type Error = mpsc::SendError<gpio::GpioValue>;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.tx.send(gpio::GpioValue::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.tx.send(gpio::GpioValue::High)
    }
}

#[cfg(test)]
mod tests {
    use super::{BitSender, Client, Packet, SerialData, TestGpioOut};
    use gpio::GpioValue;
    use std::{sync::mpsc, time::Duration};

    #[test]
    fn parse_roundtrip() {
        let packet = Packet::new((3u8, 1u8), core::f32::consts::PI.to_bits());
        let serial_data: SerialData = packet.into();

        assert_eq!(serial_data.1, Packet::<(u8, u8), u32>::BITS as u8);
        assert_eq!(packet.get(), Packet::<(u8, u8), u32>::parse(serial_data));
    }

    #[test]
    fn sender_waveform_carries_bits() {
        let (clock_tx, _clock_rx) = mpsc::channel();
        let (data_tx, data_rx) = mpsc::channel();

        let packet = Packet::new((2u8, 1u8), 0xDEAD_BEEFu32);
        let serial_data: SerialData = packet.into();
        let (bits, len) = serial_data;

        let mut sender = BitSender::new(
            TestGpioOut::new(clock_tx),
            TestGpioOut::new(data_tx),
            Duration::from_micros(50),
        );

        sender.start().unwrap();
        sender.send(serial_data).unwrap();

        let data_events: Vec<GpioValue> = data_rx.try_iter().collect();

        // One level from `start()` before the send, then within the send one
        // from its own `start()`, the begin marker, one level per bit, and
        // the trailing `start()`.
        assert_eq!(data_events.len(), 3 + len as usize + 1);

        for i in 0..len {
            let expect = bits << i & (1 << len - 1) != 0;
            let level = data_events[3 + i as usize];
            assert_eq!(level == GpioValue::High, expect, "bit {}", i);
        }
    }

    #[test]
    fn client_drives_pins() {
        let (clock_tx, clock_rx) = mpsc::channel();
        let (data_tx, _data_rx) = mpsc::channel();

        let mut client = Client::new(
            TestGpioOut::new(clock_tx),
            TestGpioOut::new(data_tx),
            Duration::from_micros(50),
        );

        let packet = Packet::new((1u8, 1u8), 314u32);
        let head = client.send(packet).unwrap();
        assert_eq!(head, (1u8, 1u8));

        // Start, begin marker, two edges per bit, trailing start.
        let expected = 2 + 2 * Packet::<(u8, u8), u32>::BITS as usize + 1;

        for _ in 0..expected {
            clock_rx
                .recv_timeout(Duration::from_secs(1))
                .expect("client thread should drive the clock pin");
        }
    }
}
