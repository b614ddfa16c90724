//! STM32L476RG register backends for the board drivers
//!
//! Every type here is zero-sized; the register blocks are global. Pin
//! assignments follow the Nucleo-L476RG: LEDs on PA5/PA6/PB3, USART2 on
//! PA2/PA3 (AF7, ST-LINK virtual COM port), ADC1 channel 6 on PA1, button on
//! PA0 (EXTI0).

use cortex_m::peripheral::NVIC;
use stm32_metapac as pac;
use pac::gpio::vals::{Moder, Odr, Ospeedr, Ot, Pupdr};

use crate::bsp::adc::{AdcRegs, Sample};
use crate::bsp::button::{ExtiLines, BUTTON_LINE};
use crate::bsp::led::{Color, LedPins};
use crate::bsp::uart::SerialPort;
use crate::os::config::CFG_CPU_CLOCK_HZ;
use crate::os::critical::critical_section;

/// Core clock after reset: MSI range 6
pub const SYSCLK_HZ: u32 = CFG_CPU_CLOCK_HZ;

fn unmask(irq: pac::Interrupt) {
    // SAFETY: handlers for every unmasked line are linked in by the firmware
    unsafe { NVIC::unmask(irq) };
}

// ============ LEDs ============

/// LED pins on GPIOA/GPIOB
pub struct NucleoLeds;

impl NucleoLeds {
    fn pin(color: Color) -> (pac::gpio::Gpio, usize) {
        match color {
            Color::Green => (pac::GPIOA, 5),
            Color::Red => (pac::GPIOA, 6),
            Color::Blue => (pac::GPIOB, 3),
        }
    }
}

impl LedPins for NucleoLeds {
    fn configure(&self, color: Color) {
        pac::RCC.ahb2enr().modify(|w| match color {
            Color::Blue => w.set_gpioben(true),
            _ => w.set_gpioaen(true),
        });

        let (port, n) = Self::pin(color);
        port.moder().modify(|w| w.set_moder(n, Moder::OUTPUT));
        port.otyper().modify(|w| w.set_ot(n, Ot::PUSHPULL));
        port.ospeedr().modify(|w| w.set_ospeedr(n, Ospeedr::LOWSPEED));
        port.pupdr().modify(|w| w.set_pupdr(n, Pupdr::FLOATING));
    }

    fn write(&self, color: Color, on: bool) {
        let (port, n) = Self::pin(color);
        port.bsrr().write(|w| {
            if on {
                w.set_bs(n, true)
            } else {
                w.set_br(n, true)
            }
        });
    }

    fn is_set(&self, color: Color) -> bool {
        let (port, n) = Self::pin(color);
        port.odr().read().odr(n) == Odr::HIGH
    }

    fn toggle(&self, color: Color) {
        critical_section(|_cs| self.write(color, !self.is_set(color)));
    }
}

// ============ USART2 ============

/// USART2, 8N1, receive interrupt enabled
pub struct Usart2;

impl Usart2 {
    pub const BAUD: u32 = 9600;

    /// Clock the port, route PA2/PA3 and enable TX, RX and the RXNE interrupt
    pub fn init(&self, pclk_hz: u32, baud: u32) {
        pac::RCC.ahb2enr().modify(|w| w.set_gpioaen(true));
        pac::RCC.apb1enr1().modify(|w| w.set_usart2en(true));

        for n in [2, 3] {
            pac::GPIOA.moder().modify(|w| w.set_moder(n, Moder::ALTERNATE));
            pac::GPIOA.afr(0).modify(|w| w.set_afr(n, 7));
            pac::GPIOA.ospeedr().modify(|w| w.set_ospeedr(n, Ospeedr::VERYHIGHSPEED));
            pac::GPIOA.pupdr().modify(|w| w.set_pupdr(n, Pupdr::PULLUP));
        }

        let usart = pac::USART2;
        usart.cr1().modify(|w| w.set_ue(false));
        usart.brr().write(|w| w.set_brr((pclk_hz / baud) as u16));
        usart.cr1().modify(|w| {
            w.set_te(true);
            w.set_re(true);
            w.set_rxneie(true);
            w.set_ue(true);
        });
        while !usart.isr().read().teack() {}

        unmask(pac::Interrupt::USART2);
    }
}

impl SerialPort for Usart2 {
    #[inline]
    fn tx_ready(&self) -> bool {
        pac::USART2.isr().read().txe()
    }

    #[inline]
    fn write_byte(&self, byte: u8) {
        pac::USART2.tdr().write(|w| w.set_dr(byte as u16));
    }

    #[inline]
    fn rx_ready(&self) -> bool {
        pac::USART2.isr().read().rxne()
    }

    #[inline]
    fn read_byte(&self) -> u8 {
        pac::USART2.rdr().read().dr() as u8
    }
}

// ============ ADC1 ============

/// ADC1, one regular conversion of channel 6, 12-bit right aligned,
/// software trigger, end-of-conversion interrupt
pub struct Adc1;

impl Adc1 {
    pub const CHANNEL: usize = 6;

    pub fn init(&self) {
        let adc = pac::ADC1;

        adc.cr().modify(|w| w.set_aden(false));
        pac::RCC.ahb2enr().modify(|w| {
            w.set_gpioaen(true);
            w.set_adcen(true);
        });

        // Synchronous HCLK/1
        pac::ADC123_COMMON.ccr().modify(|w| w.set_ckmode(pac::adccommon::vals::Ckmode::SYNCDIV1));

        // Leave deep power-down, start the regulator and give it 20 us
        adc.cr().modify(|w| w.set_deeppwd(false));
        adc.cr().modify(|w| w.set_advregen(true));
        cortex_m::asm::delay(SYSCLK_HZ / 50_000);

        adc.smpr(0).modify(|w| w.set_smp(Self::CHANNEL, pac::adc::vals::SampleTime::CYCLES47_5));

        // Channels reset to single-ended, so calibrate for that
        adc.cr().modify(|w| w.set_adcal(true));
        while adc.cr().read().adcal() {}

        adc.cr().modify(|w| w.set_aden(true));

        // PA1 analog, switch connected to the ADC
        pac::GPIOA.moder().modify(|w| w.set_moder(1, Moder::ANALOG));
        connect_analog_switch(1);

        adc.cfgr().modify(|w| {
            w.set_res(pac::adc::vals::Res::BITS12);
            w.set_align(false);
            w.set_cont(false);
            w.set_exten(pac::adc::vals::Exten::DISABLED);
        });
        adc.sqr1().modify(|w| {
            w.set_l(0);
            w.set_sq(0, Self::CHANNEL as u8);
        });
        adc.ier().modify(|w| w.set_eocie(true));

        while !adc.isr().read().adrdy() {}

        unmask(pac::Interrupt::ADC1_2);
    }
}

/// GPIOx_ASCR is specific to the L47x/L48x and absent from the register
/// description, so it is written directly.
fn connect_analog_switch(pin: u32) {
    const ASCR_OFFSET: usize = 0x2C;
    let ascr = unsafe { (pac::GPIOA.as_ptr() as *mut u8).add(ASCR_OFFSET) as *mut u32 };
    critical_section(|_cs| unsafe {
        let v = core::ptr::read_volatile(ascr);
        core::ptr::write_volatile(ascr, v | 1 << pin);
    });
}

impl AdcRegs for Adc1 {
    fn start_conversion(&self) {
        pac::ADC1.cr().modify(|w| w.set_adstart(true));
    }

    fn stop_conversion(&self) -> Option<Sample> {
        let adc = pac::ADC1;
        if adc.cr().read().adstart() {
            adc.cr().modify(|w| w.set_adstp(true));
            // ADSTP and ADSTART clear together once the ADC is idle
            while adc.cr().read().adstp() {}
        }
        self.take_end_of_conversion()
    }

    fn take_end_of_conversion(&self) -> Option<Sample> {
        let adc = pac::ADC1;
        if !adc.isr().read().eoc() {
            return None;
        }
        let sample = adc.dr().read().rdata();
        adc.isr().write(|w| w.set_eoc(true));
        Some(sample)
    }
}

// ============ Button / EXTI ============

/// EXTI bank 1
pub struct Exti;

impl Exti {
    /// PA0 as floating input, rising edge on line 0
    pub fn init_button(&self) {
        pac::RCC.ahb2enr().modify(|w| w.set_gpioaen(true));
        pac::GPIOA.moder().modify(|w| w.set_moder(0, Moder::INPUT));
        pac::GPIOA.pupdr().modify(|w| w.set_pupdr(0, Pupdr::FLOATING));

        pac::RCC.apb2enr().modify(|w| w.set_syscfgen(true));
        // Port A is source 0
        pac::SYSCFG.exticr(0).modify(|w| w.set_exti(BUTTON_LINE as usize, 0));

        let line = BUTTON_LINE as usize;
        pac::EXTI.imr(0).modify(|w| w.set_line(line, true));
        pac::EXTI.rtsr(0).modify(|w| w.set_line(line, true));

        unmask(pac::Interrupt::EXTI0);
    }
}

impl ExtiLines for Exti {
    fn is_pending(&self, line: u8) -> bool {
        pac::EXTI.pr(0).read().line(line as usize)
    }

    fn clear_pending(&self, line: u8) {
        pac::EXTI.pr(0).write(|w| w.set_line(line as usize, true));
    }
}
