use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::RecorderError;
use crate::traits::recorder_delegate::RecorderDelegate;
use crate::traits::settings_store::SettingsStore;

/// Digit placeholder used in masks.
pub const MASK_PLACEHOLDER: char = '0';
pub const MIN_MASK_WIDTH: usize = 1;
pub const MAX_MASK_WIDTH: usize = 6;

pub const ORDER_NUMBER_KEY: &str = "order_number";
pub const ORDER_MASK_KEY: &str = "order_number_mask";
pub const ORDER_ENABLED_KEY: &str = "order_number_enabled";

const DEFAULT_VALUE: u32 = 1;

/// Zero-padded track counter stamped into output file names.
///
/// Invariant: `value <= 10^width - 1` and `width` is within
/// `MIN_MASK_WIDTH..=MAX_MASK_WIDTH`. Commands that would break it are
/// no-ops rather than errors. Every effective change is persisted and
/// reported to the delegate, after the internal lock is released.
pub struct OrderNumberMask {
    store: Option<Arc<dyn SettingsStore>>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    counter: Mutex<Counter>,
}

struct Counter {
    value: u32,
    width: usize,
    enabled: bool,
    unsaved: bool,
}

impl Counter {
    fn max_value(&self) -> u32 {
        max_for_width(self.width)
    }

    fn mask(&self) -> String {
        MASK_PLACEHOLDER.to_string().repeat(self.width)
    }

    fn format(&self) -> String {
        format!("{:0width$}", self.value, width = self.width)
    }
}

impl OrderNumberMask {
    /// Detached counter with no persistence. Out-of-range input is clamped.
    pub fn new(value: u32, mask: &str) -> Self {
        let width = parse_mask(mask).unwrap_or(3);
        Self::with_counter(
            None,
            Counter {
                value: value.min(max_for_width(width)),
                width,
                enabled: true,
                unsaved: false,
            },
        )
    }

    /// Restore the counter from `store`, falling back to `default_mask` and
    /// a value of 1 when stored data is missing or malformed.
    pub fn load(store: Arc<dyn SettingsStore>, default_mask: &str) -> Self {
        let read = |key: &str| match store.load(key) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                None
            }
        };

        let width = read(ORDER_MASK_KEY)
            .as_deref()
            .and_then(parse_mask)
            .or_else(|| parse_mask(default_mask))
            .unwrap_or(3);
        let value = read(ORDER_NUMBER_KEY)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_VALUE)
            .min(max_for_width(width));
        let enabled = read(ORDER_ENABLED_KEY)
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        Self::with_counter(
            Some(store),
            Counter {
                value,
                width,
                enabled,
                unsaved: false,
            },
        )
    }

    fn with_counter(store: Option<Arc<dyn SettingsStore>>, counter: Counter) -> Self {
        Self {
            store,
            delegate: None,
            counter: Mutex::new(counter),
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn value(&self) -> u32 {
        self.counter.lock().value
    }

    pub fn width(&self) -> usize {
        self.counter.lock().width
    }

    pub fn mask(&self) -> String {
        self.counter.lock().mask()
    }

    /// Largest value the current mask can render.
    pub fn max_value(&self) -> u32 {
        self.counter.lock().max_value()
    }

    pub fn is_enabled(&self) -> bool {
        self.counter.lock().enabled
    }

    /// True when the last persistence write failed.
    pub fn has_unsaved_changes(&self) -> bool {
        self.counter.lock().unsaved
    }

    /// Render the value zero-padded to the mask width.
    pub fn format(&self) -> String {
        self.counter.lock().format()
    }

    pub fn increment(&self) -> bool {
        self.update(|c| {
            if c.value >= c.max_value() {
                return false;
            }
            c.value += 1;
            true
        })
    }

    pub fn decrement(&self) -> bool {
        self.update(|c| {
            if c.value == 0 {
                return false;
            }
            c.value -= 1;
            true
        })
    }

    pub fn grow_mask(&self) -> bool {
        self.update(|c| {
            if c.width >= MAX_MASK_WIDTH {
                return false;
            }
            c.width += 1;
            true
        })
    }

    /// Removes one placeholder. Refused when the current value would no
    /// longer fit, so no digit is ever hidden.
    pub fn shrink_mask(&self) -> bool {
        self.update(|c| {
            if c.width <= MIN_MASK_WIDTH || c.value > max_for_width(c.width - 1) {
                return false;
            }
            c.width -= 1;
            true
        })
    }

    /// Up gesture: grows the mask with the modifier held, increments otherwise.
    pub fn adjust_up(&self, modifier_held: bool) -> bool {
        if modifier_held {
            self.grow_mask()
        } else {
            self.increment()
        }
    }

    /// Down gesture: shrinks the mask with the modifier held, decrements otherwise.
    pub fn adjust_down(&self, modifier_held: bool) -> bool {
        if modifier_held {
            self.shrink_mask()
        } else {
            self.decrement()
        }
    }

    /// Accept a user-typed value. Anything that is not a non-negative integer
    /// within the bound is ignored and the current value is re-announced.
    pub fn set_from_text(&self, text: &str) -> bool {
        let parsed = text.trim().parse::<u32>().ok();
        let mut accepted = false;
        self.update(|c| match parsed {
            Some(value) if value <= c.max_value() => {
                accepted = true;
                let changed = value != c.value;
                c.value = value;
                changed
            }
            _ => false,
        });

        if !accepted {
            log::debug!("Ignoring order number input {:?}", text);
            self.announce();
        }
        accepted
    }

    /// Advance after a recorded track, if numbering is enabled.
    pub fn advance_if_enabled(&self) -> bool {
        self.update(|c| {
            if !c.enabled || c.value >= c.max_value() {
                return false;
            }
            c.value += 1;
            true
        })
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.update(|c| {
            let changed = c.enabled != enabled;
            c.enabled = enabled;
            changed
        });
    }

    /// Report the current value without changing it, e.g. at startup.
    pub fn announce(&self) {
        let formatted = self.format();
        self.notify(&formatted, None);
    }

    /// Apply `change` under the lock; when it reports a change, persist and
    /// then notify once the lock is released.
    fn update(&self, change: impl FnOnce(&mut Counter) -> bool) -> bool {
        let (formatted, failure) = {
            let mut c = self.counter.lock();
            if !change(&mut *c) {
                return false;
            }
            log::debug!("Order number {} (mask {})", c.format(), c.mask());
            let failure = self.persist(&mut *c);
            (c.format(), failure)
        };

        self.notify(&formatted, failure.as_ref());
        true
    }

    fn persist(&self, c: &mut Counter) -> Option<RecorderError> {
        let store = self.store.as_ref()?;
        let result = store
            .save(ORDER_NUMBER_KEY, &c.value.to_string())
            .and_then(|_| store.save(ORDER_MASK_KEY, &c.mask()))
            .and_then(|_| store.save(ORDER_ENABLED_KEY, &c.enabled.to_string()));

        match result {
            Ok(()) => {
                c.unsaved = false;
                None
            }
            Err(e) => {
                log::warn!("Order number not persisted: {}", e);
                c.unsaved = true;
                Some(e)
            }
        }
    }

    fn notify(&self, formatted: &str, failure: Option<&RecorderError>) {
        if let Some(ref delegate) = self.delegate {
            if let Some(error) = failure {
                delegate.on_error(error);
            }
            delegate.on_order_number_changed(formatted);
        }
    }
}

fn max_for_width(width: usize) -> u32 {
    10u32.pow(width as u32) - 1
}

fn parse_mask(mask: &str) -> Option<usize> {
    let width = mask.chars().count();
    let valid = (MIN_MASK_WIDTH..=MAX_MASK_WIDTH).contains(&width)
        && mask.chars().all(|c| c == MASK_PLACEHOLDER);
    valid.then_some(width)
}

/// Parse a value read back from a formatted order number.
pub fn parse_formatted(formatted: &str) -> Result<u32, RecorderError> {
    formatted
        .parse::<u32>()
        .map_err(|e| RecorderError::ConfigurationFailed(format!("invalid order number {:?}: {}", formatted, e)))
}
