/*!
 * Keygrip computation
 *
 * A keygrip is a SHA-1 digest over a key's public parameters, hashed the
 * way libgcrypt serializes them. Unlike the OpenPGP fingerprint it does not
 * depend on creation time or packet version, so every copy of a key seen
 * from any source yields the same grip.
 */

mod curves;
mod grip;

pub use curves::{Curve, CurveParams};
pub use grip::{compute_grip, Grip, GRIP_SIZE};
