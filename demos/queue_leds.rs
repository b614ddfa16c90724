//! Queue hand-off between two tasks, shown on the LEDs
//!
//! The sender posts without waiting and toggles green per accepted value,
//! once a second. The receiver waits up to 100 ms: red on a value, blue on
//! a timeout.

#![no_std]
#![no_main]

use core::ptr::addr_of_mut;

use cortex_m_rt::entry;
use rtdaq::bsp::stm32l4::NucleoLeds;
use rtdaq::bsp::{Color, Leds};
use rtdaq::time::os_time_dly_ms;
use rtdaq::types::OsStkElement;
use rtdaq::{os_task_create, OsTcb, Queue, Timeout};

static LEDS: Leds<NucleoLeds> = Leds::new(NucleoLeds);
static VALUES: Queue<u32, 10> = Queue::new();

static mut SENDER_TCB: OsTcb = OsTcb::new();
static mut SENDER_STK: [OsStkElement; 256] = [0; 256];
static mut RECEIVER_TCB: OsTcb = OsTcb::new();
static mut RECEIVER_STK: [OsStkElement; 256] = [0; 256];

fn sender_task(_: *mut ()) -> ! {
    loop {
        match VALUES.send(100, Timeout::NoWait) {
            Ok(()) => {
                LEDS.toggle(Color::Green);
                let _ = os_time_dly_ms(1000);
            }
            // Queue full; try again next tick
            Err(_) => {
                let _ = os_time_dly_ms(1);
            }
        }
    }
}

fn receiver_task(_: *mut ()) -> ! {
    loop {
        match VALUES.receive(Timeout::from_ms(100)) {
            Ok(_) => LEDS.toggle(Color::Red),
            Err(_) => LEDS.toggle(Color::Blue),
        }
    }
}

#[entry]
fn main() -> ! {
    rtdaq::os_init().expect("OS init failed");
    VALUES.create("values").expect("queue create failed");
    LEDS.configure_all();

    unsafe {
        os_task_create(
            &mut *addr_of_mut!(SENDER_TCB),
            &mut *addr_of_mut!(SENDER_STK),
            "Sender",
            sender_task,
            5,
        )
        .expect("sender task failed");

        os_task_create(
            &mut *addr_of_mut!(RECEIVER_TCB),
            &mut *addr_of_mut!(RECEIVER_STK),
            "Receiver",
            receiver_task,
            5,
        )
        .expect("receiver task failed");
    }

    rtdaq::os_start().expect("OS start failed");

    loop {
        cortex_m::asm::wfi();
    }
}
