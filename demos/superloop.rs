//! Temperature monitor without the kernel
//!
//! One loop samples, reports over USART2 and services a latched button
//! press. Reports go straight to the serial port.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use rtdaq::app::config::{MODE_LED, UART_BAUD};
use rtdaq::app::{Calibration, DirectSink, Message, MessageSink};
use rtdaq::bsp::stm32l4::{Adc1, Exti, NucleoLeds, Usart2, SYSCLK_HZ};
use rtdaq::bsp::{on_exti_interrupt, Leds, PressFlag, Sampler, Uart};

static LEDS: Leds<NucleoLeds> = Leds::new(NucleoLeds);
static UART: Uart<Usart2> = Uart::new(Usart2);
static SAMPLER: Sampler<Adc1> = Sampler::new(Adc1);
static PRESSED: PressFlag = PressFlag::new();

#[no_mangle]
extern "C" fn ADC1_2() {
    SAMPLER.on_end_of_conversion();
}

#[no_mangle]
extern "C" fn EXTI0() {
    let _ = on_exti_interrupt(&Exti, &PRESSED);
}

#[entry]
fn main() -> ! {
    Exti.init_button();
    LEDS.configure(MODE_LED);
    Adc1.init();
    Usart2.init(SYSCLK_HZ, UART_BAUD);

    LEDS.off(MODE_LED);
    UART.print("Temperature Sensor Initialized\n\r");

    let sink = DirectSink::new(&UART);
    let calibration = Calibration::DEFAULT;

    loop {
        SAMPLER.start();
        if let Some(sample) = SAMPLER.latest() {
            sink.emit(Message::temperature(calibration.celsius(sample)));
        }

        if PRESSED.take() {
            LEDS.on(MODE_LED);
            UART.print("Button Pressed\n\r");
            LEDS.off(MODE_LED);
        }

        // Roughly 100 ms at the reset clock
        cortex_m::asm::delay(SYSCLK_HZ / 10);
    }
}
