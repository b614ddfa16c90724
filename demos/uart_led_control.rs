//! Serial LED control
//!
//! Bytes received on USART2 are queued by the receive interrupt. The
//! console task toggles green on `1`, red on `2`, and complains about
//! anything else or about 100 ms of silence.

#![no_std]
#![no_main]

use core::ptr::addr_of_mut;

use cortex_m_rt::entry;
use rtdaq::app::config::{CONSOLE_RX_TIMEOUT_MS, PRIO_PIPELINE, RX_QUEUE_LEN, TASK_STK_SIZE, UART_BAUD};
use rtdaq::app::Console;
use rtdaq::bsp::stm32l4::{NucleoLeds, Usart2, SYSCLK_HZ};
use rtdaq::bsp::{on_rx_interrupt, Leds, Uart};
use rtdaq::types::OsStkElement;
use rtdaq::{os_task_create, os_yield_from_isr, OsTcb, Queue, Timeout};

static LEDS: Leds<NucleoLeds> = Leds::new(NucleoLeds);
static UART: Uart<Usart2> = Uart::new(Usart2);
static RX: Queue<u8, RX_QUEUE_LEN> = Queue::new();

static CONSOLE: Console<'static, NucleoLeds, Usart2, RX_QUEUE_LEN> =
    Console::new(&RX, &LEDS, &UART, Timeout::from_ms(CONSOLE_RX_TIMEOUT_MS));

static mut CONSOLE_TCB: OsTcb = OsTcb::new();
static mut CONSOLE_STK: [OsStkElement; TASK_STK_SIZE] = [0; TASK_STK_SIZE];

fn console_task(_: *mut ()) -> ! {
    CONSOLE.run()
}

#[no_mangle]
extern "C" fn USART2() {
    os_yield_from_isr(on_rx_interrupt(&Usart2, &RX));
}

#[entry]
fn main() -> ! {
    rtdaq::os_init().expect("OS init failed");
    RX.create("rx").expect("rx queue create failed");

    Usart2.init(SYSCLK_HZ, UART_BAUD);
    UART.print("System Initialized!\n\r");
    LEDS.configure_all();

    unsafe {
        os_task_create(
            &mut *addr_of_mut!(CONSOLE_TCB),
            &mut *addr_of_mut!(CONSOLE_STK),
            "Console",
            console_task,
            PRIO_PIPELINE,
        )
        .expect("console task failed");
    }

    rtdaq::os_start().expect("OS start failed");

    loop {
        cortex_m::asm::wfi();
    }
}
