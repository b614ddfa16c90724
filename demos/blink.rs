//! Blink - two tasks of equal priority sharing the CPU
//!
//! Green toggles every 500 ms, red every second.

#![no_std]
#![no_main]

use core::ptr::addr_of_mut;

use cortex_m_rt::entry;
use rtdaq::bsp::stm32l4::NucleoLeds;
use rtdaq::bsp::{Color, Leds};
use rtdaq::time::os_time_dly_ms;
use rtdaq::types::OsStkElement;
use rtdaq::{os_task_create, OsTcb};

static LEDS: Leds<NucleoLeds> = Leds::new(NucleoLeds);

static mut GREEN_STK: [OsStkElement; 256] = [0; 256];
static mut GREEN_TCB: OsTcb = OsTcb::new();
static mut RED_STK: [OsStkElement; 256] = [0; 256];
static mut RED_TCB: OsTcb = OsTcb::new();

fn green_task(_: *mut ()) -> ! {
    rtdaq::info!("green task started");
    loop {
        LEDS.toggle(Color::Green);
        let _ = os_time_dly_ms(500);
    }
}

fn red_task(_: *mut ()) -> ! {
    rtdaq::info!("red task started");
    loop {
        LEDS.toggle(Color::Red);
        let _ = os_time_dly_ms(1000);
    }
}

#[entry]
fn main() -> ! {
    LEDS.configure(Color::Green);
    LEDS.configure(Color::Red);
    LEDS.off(Color::Green);
    LEDS.off(Color::Red);

    rtdaq::os_init().expect("OS init failed");

    unsafe {
        os_task_create(
            &mut *addr_of_mut!(GREEN_TCB),
            &mut *addr_of_mut!(GREEN_STK),
            "Green",
            green_task,
            5,
        )
        .expect("green task failed");

        os_task_create(
            &mut *addr_of_mut!(RED_TCB),
            &mut *addr_of_mut!(RED_STK),
            "Red",
            red_task,
            5,
        )
        .expect("red task failed");
    }

    rtdaq::info!("Starting RTOS");
    rtdaq::os_start().expect("OS start failed");

    loop {
        cortex_m::asm::nop();
    }
}
