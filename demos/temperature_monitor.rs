//! Temperature monitor - the full acquisition pipeline
//!
//! The button on PA0 cycles Idle -> Monitor -> Log. While sampling, ADC1
//! channel 6 (PA1) is converted every 500 ms and a temperature report is
//! logged over USART2 at 9600 baud. The red LED shows that sampling is on.

#![no_std]
#![no_main]

use core::ptr::addr_of_mut;

use cortex_m_rt::entry;
use rtdaq::app::config::{
    MESSAGE_QUEUE_LEN, MODE_LED, PRIO_LOGGER, PRIO_PIPELINE, SAMPLE_PERIOD_MS, SAMPLE_QUEUE_LEN,
    TASK_STK_SIZE, UART_BAUD,
};
use rtdaq::app::{diag, Acquisition, ButtonMode, Calibration, Logger, Message, Mode, ModeCell, Processing};
use rtdaq::bsp::stm32l4::{Adc1, Exti, NucleoLeds, Usart2, SYSCLK_HZ};
use rtdaq::bsp::{on_exti_interrupt, Leds, Sample, Sampler, Uart};
use rtdaq::types::OsStkElement;
use rtdaq::{os_task_create, os_yield_from_isr, BinarySemaphore, OsTcb, Queue};

type MessageQueue = Queue<Message, MESSAGE_QUEUE_LEN>;

// ============ Shared Objects ============

static LEDS: Leds<NucleoLeds> = Leds::new(NucleoLeds);
static UART: Uart<Usart2> = Uart::new(Usart2);
static SAMPLER: Sampler<Adc1> = Sampler::new(Adc1);
static MODE: ModeCell = ModeCell::new(Mode::Idle);

static PRESSES: BinarySemaphore = BinarySemaphore::new();
static SAMPLES: Queue<Sample, SAMPLE_QUEUE_LEN> = Queue::new();
static MESSAGES: MessageQueue = Queue::new();

// ============ Tasks ============

static ACQUISITION: Acquisition<'static, Adc1, MessageQueue, SAMPLE_QUEUE_LEN> =
    Acquisition::new(&MODE, &SAMPLER, &SAMPLES, &MESSAGES, SAMPLE_PERIOD_MS);
static PROCESSING: Processing<'static, MessageQueue, SAMPLE_QUEUE_LEN> =
    Processing::new(&SAMPLES, Calibration::DEFAULT, &MESSAGES);
static BUTTON: ButtonMode<'static, NucleoLeds, MessageQueue> =
    ButtonMode::new(&PRESSES, &MODE, &LEDS, MODE_LED, &MESSAGES);
static LOGGER: Logger<'static, Usart2, MESSAGE_QUEUE_LEN> = Logger::new(&MESSAGES, &UART);

static mut ACQ_TCB: OsTcb = OsTcb::new();
static mut ACQ_STK: [OsStkElement; TASK_STK_SIZE] = [0; TASK_STK_SIZE];
static mut PROC_TCB: OsTcb = OsTcb::new();
static mut PROC_STK: [OsStkElement; TASK_STK_SIZE] = [0; TASK_STK_SIZE];
static mut BUTTON_TCB: OsTcb = OsTcb::new();
static mut BUTTON_STK: [OsStkElement; TASK_STK_SIZE] = [0; TASK_STK_SIZE];
static mut LOGGER_TCB: OsTcb = OsTcb::new();
static mut LOGGER_STK: [OsStkElement; TASK_STK_SIZE] = [0; TASK_STK_SIZE];

fn acquisition_task(_: *mut ()) -> ! {
    ACQUISITION.run()
}

fn processing_task(_: *mut ()) -> ! {
    PROCESSING.run()
}

fn button_task(_: *mut ()) -> ! {
    BUTTON.run()
}

fn logger_task(_: *mut ()) -> ! {
    LOGGER.run()
}

// ============ Interrupts ============

#[no_mangle]
extern "C" fn ADC1_2() {
    SAMPLER.on_end_of_conversion();
}

#[no_mangle]
extern "C" fn EXTI0() {
    os_yield_from_isr(on_exti_interrupt(&Exti, &PRESSES));
}

// ============ Main ============

#[entry]
fn main() -> ! {
    rtdaq::os_init().expect("OS init failed");

    PRESSES.create("button").expect("semaphore create failed");
    SAMPLES.create("samples").expect("sample queue create failed");
    MESSAGES.create("messages").expect("message queue create failed");

    Exti.init_button();
    LEDS.configure_all();
    Adc1.init();
    Usart2.init(SYSCLK_HZ, UART_BAUD);

    UART.print(diag::CLOCK_BANNER);
    UART.print(Message::clock_frequency(SYSCLK_HZ).as_str());
    LEDS.off(MODE_LED);

    unsafe {
        os_task_create(
            &mut *addr_of_mut!(ACQ_TCB),
            &mut *addr_of_mut!(ACQ_STK),
            "Acquisition",
            acquisition_task,
            PRIO_PIPELINE,
        )
        .expect("acquisition task failed");

        os_task_create(
            &mut *addr_of_mut!(PROC_TCB),
            &mut *addr_of_mut!(PROC_STK),
            "Processing",
            processing_task,
            PRIO_PIPELINE,
        )
        .expect("processing task failed");

        os_task_create(
            &mut *addr_of_mut!(BUTTON_TCB),
            &mut *addr_of_mut!(BUTTON_STK),
            "Button",
            button_task,
            PRIO_PIPELINE,
        )
        .expect("button task failed");

        os_task_create(
            &mut *addr_of_mut!(LOGGER_TCB),
            &mut *addr_of_mut!(LOGGER_STK),
            "Logger",
            logger_task,
            PRIO_LOGGER,
        )
        .expect("logger task failed");
    }

    rtdaq::info!("starting pipeline");
    rtdaq::os_start().expect("OS start failed");

    loop {
        cortex_m::asm::wfi();
    }
}
