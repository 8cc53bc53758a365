use crate::radio::{HostPort, Radio};
use crate::timer::Clock;
use crate::tnc::Tnc;
use embedded_hal::delay::DelayNs;

/// Runs a blocking loop that repeatedly calls `tick()` on the provided TNC.
///
/// This is a simple scheduling loop for firmware that has nothing else to do
/// between ticks. The delay only paces the loop; all protocol timing comes from
/// the TNC's own clock, so a coarse or imprecise delay is harmless.
///
/// # Arguments
/// - `tnc`: A mutable reference to a `Tnc` instance.
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL.
/// - `tick_ms`: The pause between ticks, in milliseconds (e.g. 1).
///
/// # Example
/// ```rust,ignore
/// use kiss_tnc::timer::run_tnc_loop;
/// let mut tnc = Tnc::new(radio, uart, || millis(), &RX_NOTIFIER, TncConfig::default());
/// run_tnc_loop(&mut tnc, &mut delay, 1);
/// ```
///
/// # Notes
/// - This loop will never return; it is intended for single-purpose polling firmware.
pub fn run_tnc_loop<D, R, H, C>(tnc: &mut Tnc<'_, R, H, C>, delay: &mut D, tick_ms: u32) -> !
where
    D: DelayNs,
    R: Radio,
    H: HostPort,
    C: Clock,
{
    loop {
        let _ = tnc.tick();
        delay.delay_ms(tick_ms);
    }
}
