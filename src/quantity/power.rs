quantity!(Watts, "W");

// Device power caps (`max_charge_power_w`, `max_ac_power_w`, ...) are stored
// as `WattHours` rather than `Watts`: every simulated step is exactly one
// hour, so a sustained power limit and the energy it bounds for that hour
// are numerically identical. `Watts` itself stays around for a constant
// power value that hasn't yet been integrated over an hour, see
// `WattHours::per_hour`.
