// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! USB CDC byte link.
//!
//! The device is serviced from `USBCTRL_IRQ`. Each read from the CDC
//! endpoint becomes one frame in the inbox. While the inbox slot is taken
//! the endpoint is left unread, so the host is NAKed instead of losing data;
//! taking a frame re-pends the interrupt to drain what was held back.

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use cortex_m::peripheral::NVIC;
use rp2040_hal as hal;
use rp2040_hal::pac::{self, interrupt};
use rp2040_hal::usb::UsbBus;
use serboot_common::{Frame, FrameProducer, FrameReceiver, FrameSource};
use usb_device::class_prelude::UsbBusAllocator;
use usb_device::prelude::*;
use usbd_serial::SerialPort;

use crate::peripherals::UsbPeripherals;

/// One full-speed bulk packet.
const RX_CHUNK: usize = 64;

/// Give up on a reply after this many polls without endpoint space.
const TX_RETRIES: u32 = 100_000;

struct UsbLink {
    serial: SerialPort<'static, UsbBus>,
    usb_dev: UsbDevice<'static, UsbBus>,
    inbox: FrameProducer<'static>,
}

static USB_LINK: Mutex<RefCell<Option<UsbLink>>> = Mutex::new(RefCell::new(None));

impl UsbLink {
    fn new(usb_bus: &'static UsbBusAllocator<UsbBus>, inbox: FrameProducer<'static>) -> Self {
        let serial = SerialPort::new(usb_bus);
        let usb_dev = UsbDeviceBuilder::new(usb_bus, UsbVidPid(0x2E8A, 0x000A))
            .strings(&[StringDescriptors::default()
                .manufacturer("ADNT")
                .product("serboot")
                .serial_number("0001")])
            .unwrap()
            .device_class(usbd_serial::USB_CLASS_CDC)
            .build();

        Self {
            serial,
            usb_dev,
            inbox,
        }
    }

    fn service(&mut self) {
        self.usb_dev.poll(&mut [&mut self.serial]);

        if !self.inbox.is_free() {
            return;
        }

        let mut buf = [0u8; RX_CHUNK];
        if let Ok(count) = self.serial.read(&mut buf) {
            if !self.inbox.offer(&buf[..count], &[]) && count > 0 {
                defmt::warn!("usb: frame dropped ({} so far)", self.inbox.dropped());
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) {
        let mut offset = 0;
        let mut retries = TX_RETRIES;
        while offset < bytes.len() {
            match self.serial.write(&bytes[offset..]) {
                Ok(n) => offset += n,
                Err(UsbError::WouldBlock) if retries > 0 => {
                    retries -= 1;
                    self.usb_dev.poll(&mut [&mut self.serial]);
                }
                Err(_) => {
                    defmt::warn!("usb: reply truncated at {} of {} bytes", offset, bytes.len());
                    return;
                }
            }
        }
        let _ = self.serial.flush();
    }
}

/// Bring up the CDC device and start servicing it from the USB interrupt.
pub fn start(
    mut usb: UsbPeripherals,
    inbox: FrameProducer<'static>,
    frames: FrameReceiver<'static>,
) -> UsbFrames {
    let usb_bus = cortex_m::singleton!(: UsbBusAllocator<UsbBus> = UsbBusAllocator::new(
        hal::usb::UsbBus::new(usb.regs, usb.dpram, usb.clock, true, &mut usb.resets),
    ))
    .expect("USB bus already initialized");

    let link = UsbLink::new(usb_bus, inbox);
    cortex_m::interrupt::free(|cs| {
        USB_LINK.borrow(cs).replace(Some(link));
    });

    // SAFETY: the handler only touches USB_LINK through the mutex.
    unsafe { NVIC::unmask(pac::Interrupt::USBCTRL_IRQ) };

    defmt::info!("usb: CDC link up");
    UsbFrames { frames }
}

/// Send `bytes` to the host from thread mode.
pub fn send(bytes: &[u8]) {
    cortex_m::interrupt::free(|cs| {
        if let Some(link) = USB_LINK.borrow(cs).borrow_mut().as_mut() {
            link.write_all(bytes);
        }
    });
}

/// Stop servicing the link and release the device.
pub fn close() {
    NVIC::mask(pac::Interrupt::USBCTRL_IRQ);
    cortex_m::interrupt::free(|cs| {
        USB_LINK.borrow(cs).replace(None);
    });
}

/// Loop-side end of the inbox.
pub struct UsbFrames {
    frames: FrameReceiver<'static>,
}

impl FrameSource for UsbFrames {
    fn poll(&mut self) -> Option<Frame> {
        let frame = self.frames.poll()?;
        NVIC::pend(pac::Interrupt::USBCTRL_IRQ);
        Some(frame)
    }
}

#[interrupt]
fn USBCTRL_IRQ() {
    cortex_m::interrupt::free(|cs| {
        if let Some(link) = USB_LINK.borrow(cs).borrow_mut().as_mut() {
            link.service();
        }
    });
}
