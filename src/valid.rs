/// Marks whether a wrapper's payload is meaningful.
///
/// The zero value is `false`: a freshly constructed wrapper holds no value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ValidFlag(bool);

impl ValidFlag {
    pub const fn new(valid: bool) -> Self {
        Self(valid)
    }

    pub const fn is_valid(self) -> bool {
        self.0
    }

    /// Marks the payload as present.
    pub fn set_valid(&mut self) {
        self.0 = true;
    }

    /// Invalidates the payload without touching it.
    pub fn reset(&mut self) {
        self.0 = false;
    }
}

impl From<bool> for ValidFlag {
    fn from(valid: bool) -> Self {
        Self(valid)
    }
}

impl From<ValidFlag> for bool {
    fn from(flag: ValidFlag) -> Self {
        flag.0
    }
}

impl PartialEq<bool> for ValidFlag {
    fn eq(&self, other: &bool) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use crate::ValidFlag;

    #[test]
    fn defaults_to_invalid() {
        assert_eq!(ValidFlag::default(), false);
    }

    #[test]
    fn reset_clears_flag() {
        let mut flag = ValidFlag::from(true);
        flag.reset();
        assert_eq!(flag, false);
        assert!(!bool::from(flag));
    }

    #[test]
    fn set_valid_marks_present() {
        let mut flag = ValidFlag::default();
        flag.set_valid();
        assert!(flag.is_valid());
    }
}
