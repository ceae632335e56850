//! The controller state machine.
//!
//! Four states, six request kinds, one compile-time transition table. A
//! request whose table entry is [`ControllerState::Invalid`] is refused in
//! that state with no side effect and no state change; every other entry
//! names the state the controller occupies after the request succeeds.
//!
//! The table is data, not code: the controller consults it before doing any
//! work, so an inadmissible request can never touch key material or the
//! persistent blob.

/// The controller's lifecycle state.
///
/// The discriminants mirror the persisted key count plus one: the first
/// byte of the state blob is `0`, `1`, or `2`, and boot maps it to
/// `NoKeyPairs`, `OneKeyPair`, or `TwoKeyPairs`. `Invalid` is never
/// persisted; it exists only as the refusal entry in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControllerState {
    /// The refusal marker; not a reachable resting state.
    Invalid = 0,
    /// No key pair exists; only `generateKeys` can create one.
    NoKeyPairs = 1,
    /// One key pair exists; the normal operating state.
    OneKeyPair = 2,
    /// A rotation is pending: the previous pair is retained until the next
    /// successful sign consumes it.
    TwoKeyPairs = 3,
}

/// The request kinds the controller accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Request {
    /// Create the first key pair.
    GenerateKeys = 0,
    /// Replace the key pair, retaining the previous one for chain signing.
    RotateKeys = 1,
    /// Destroy all key material.
    EraseKeys = 2,
    /// Digest bytes; touches no keys.
    DigestBytes = 3,
    /// Sign bytes with the custodied key.
    SignBytes = 4,
    /// Verify a signature against a caller-supplied public key.
    ValidSignature = 5,
}

/// Number of request kinds (the width of the transition table).
pub const REQUEST_KINDS: usize = 6;

use ControllerState::{Invalid, NoKeyPairs, OneKeyPair, TwoKeyPairs};

/// The transition table. Rows are states, columns are requests in
/// [`Request`] discriminant order.
const NEXT_STATE: [[ControllerState; REQUEST_KINDS]; 4] = [
    // Generate     Rotate       Erase       Digest      Sign        Verify
    [Invalid, Invalid, Invalid, Invalid, Invalid, Invalid], // Invalid
    [OneKeyPair, Invalid, NoKeyPairs, NoKeyPairs, Invalid, NoKeyPairs], // NoKeyPairs
    [Invalid, TwoKeyPairs, NoKeyPairs, OneKeyPair, OneKeyPair, OneKeyPair], // OneKeyPair
    [Invalid, Invalid, NoKeyPairs, Invalid, OneKeyPair, Invalid], // TwoKeyPairs
];

impl ControllerState {
    /// The state the controller occupies after `request` succeeds here.
    ///
    /// Returns [`ControllerState::Invalid`] when the request is not
    /// admissible in this state.
    #[must_use]
    pub const fn next(self, request: Request) -> Self {
        NEXT_STATE[self as usize][request as usize]
    }

    /// Whether `request` is admissible in this state.
    #[must_use]
    pub const fn permits(self, request: Request) -> bool {
        !matches!(self.next(request), Invalid)
    }

    /// Map a persisted key count to the state it implies.
    ///
    /// Returns `None` for counts outside `{0, 1, 2}` so boot can treat a
    /// corrupt blob as absent.
    #[must_use]
    pub const fn from_key_count(count: u8) -> Option<Self> {
        match count {
            0 => Some(NoKeyPairs),
            1 => Some(OneKeyPair),
            2 => Some(TwoKeyPairs),
            _ => None,
        }
    }

    /// The key count this state implies (the blob's first byte).
    #[must_use]
    pub const fn key_count(self) -> u8 {
        match self {
            Invalid | NoKeyPairs => 0,
            OneKeyPair => 1,
            TwoKeyPairs => 2,
        }
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Invalid => write!(f, "invalid"),
            NoKeyPairs => write!(f, "no-key-pairs"),
            OneKeyPair => write!(f, "one-key-pair"),
            TwoKeyPairs => write!(f, "two-key-pairs"),
        }
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GenerateKeys => write!(f, "generate-keys"),
            Self::RotateKeys => write!(f, "rotate-keys"),
            Self::EraseKeys => write!(f, "erase-keys"),
            Self::DigestBytes => write!(f, "digest-bytes"),
            Self::SignBytes => write!(f, "sign-bytes"),
            Self::ValidSignature => write!(f, "valid-signature"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_REQUESTS: [Request; REQUEST_KINDS] = [
        Request::GenerateKeys,
        Request::RotateKeys,
        Request::EraseKeys,
        Request::DigestBytes,
        Request::SignBytes,
        Request::ValidSignature,
    ];

    #[test]
    fn test_generate_only_from_no_key_pairs() {
        assert_eq!(NoKeyPairs.next(Request::GenerateKeys), OneKeyPair);
        assert!(!OneKeyPair.permits(Request::GenerateKeys));
        assert!(!TwoKeyPairs.permits(Request::GenerateKeys));
    }

    #[test]
    fn test_rotate_only_from_one_key_pair() {
        assert_eq!(OneKeyPair.next(Request::RotateKeys), TwoKeyPairs);
        assert!(!NoKeyPairs.permits(Request::RotateKeys));
        // A pending rotation blocks further rotations until the sign that
        // consumes the previous pair completes.
        assert!(!TwoKeyPairs.permits(Request::RotateKeys));
    }

    #[test]
    fn test_erase_is_admissible_everywhere() {
        assert_eq!(NoKeyPairs.next(Request::EraseKeys), NoKeyPairs);
        assert_eq!(OneKeyPair.next(Request::EraseKeys), NoKeyPairs);
        assert_eq!(TwoKeyPairs.next(Request::EraseKeys), NoKeyPairs);
    }

    #[test]
    fn test_sign_consumes_the_pending_rotation() {
        assert_eq!(OneKeyPair.next(Request::SignBytes), OneKeyPair);
        assert_eq!(TwoKeyPairs.next(Request::SignBytes), OneKeyPair);
        assert!(!NoKeyPairs.permits(Request::SignBytes));
    }

    #[test]
    fn test_digest_and_verify_are_identity_where_admissible() {
        assert_eq!(NoKeyPairs.next(Request::DigestBytes), NoKeyPairs);
        assert_eq!(OneKeyPair.next(Request::DigestBytes), OneKeyPair);
        assert!(!TwoKeyPairs.permits(Request::DigestBytes));

        assert_eq!(NoKeyPairs.next(Request::ValidSignature), NoKeyPairs);
        assert_eq!(OneKeyPair.next(Request::ValidSignature), OneKeyPair);
        assert!(!TwoKeyPairs.permits(Request::ValidSignature));
    }

    #[test]
    fn test_invalid_state_permits_nothing() {
        for request in ALL_REQUESTS {
            assert!(!Invalid.permits(request));
        }
    }

    #[test]
    fn test_key_count_round_trip() {
        for state in [NoKeyPairs, OneKeyPair, TwoKeyPairs] {
            assert_eq!(
                ControllerState::from_key_count(state.key_count()),
                Some(state)
            );
        }
        assert_eq!(ControllerState::from_key_count(3), None);
        assert_eq!(ControllerState::from_key_count(255), None);
    }

    #[test]
    fn test_every_transition_lands_in_a_resting_state() {
        // No admissible request may strand the controller in Invalid.
        for state in [NoKeyPairs, OneKeyPair, TwoKeyPairs] {
            for request in ALL_REQUESTS {
                if state.permits(request) {
                    assert_ne!(state.next(request), Invalid);
                }
            }
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(TwoKeyPairs.to_string(), "two-key-pairs");
        assert_eq!(Request::SignBytes.to_string(), "sign-bytes");
    }
}
