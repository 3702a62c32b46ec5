//! Engine performance quantities: thrust, Isp, choked mass flow, c*.

use ignis_core::units::constants::{G0_MPS2, R_UNIVERSAL};

/// Thrust from the momentum and pressure terms [N].
///
/// `F = ṁ·v_e + (p_e − p_a)·A_e`
pub fn thrust(
    mass_flow_rate: f64,
    exit_velocity: f64,
    exit_pressure: f64,
    ambient_pressure: f64,
    exit_area: f64,
) -> f64 {
    let momentum_thrust = mass_flow_rate * exit_velocity;
    let pressure_thrust = (exit_pressure - ambient_pressure) * exit_area;
    momentum_thrust + pressure_thrust
}

/// Specific impulse [s]: thrust per unit propellant weight flow.
pub fn specific_impulse(thrust: f64, mass_flow_rate: f64) -> f64 {
    thrust / (mass_flow_rate * G0_MPS2)
}

/// Choked mass flow rate through the throat [kg/s].
///
/// `ṁ = p_c·A_t·sqrt((γ/R)·(2/(γ+1))^((γ+1)/(γ−1)) / T_c)`
pub fn mass_flow_rate(
    chamber_pressure: f64,
    throat_area: f64,
    chamber_temperature: f64,
    gamma: f64,
    molecular_weight: f64,
) -> f64 {
    let r_specific = R_UNIVERSAL / molecular_weight;
    let term1 = gamma / r_specific;
    let term2 = (2.0 / (gamma + 1.0)).powf((gamma + 1.0) / (gamma - 1.0));
    chamber_pressure * throat_area * (term1 * term2 / chamber_temperature).sqrt()
}

/// Characteristic velocity c* [m/s], a combustion efficiency figure.
pub fn characteristic_velocity(
    chamber_temperature: f64,
    gamma: f64,
    molecular_weight: f64,
) -> f64 {
    let r_specific = R_UNIVERSAL / molecular_weight;
    let a_chamber = (gamma * r_specific * chamber_temperature).sqrt();
    let flow_term = gamma * (2.0 / (gamma + 1.0)).powf((gamma + 1.0) / (gamma - 1.0));
    a_chamber / flow_term.sqrt()
}

/// Chamber pressure rise rate [Pa/s] for a filling model with a fixed
/// outflow fraction.
///
/// Ideal-gas molar balance: `dp/dt = ṁ_net·R·T / (M·V)` with
/// `ṁ_net = ṁ_in·(1 − outflow_coefficient)`.
pub fn chamber_pressure_rate(
    mass_flow_rate: f64,
    chamber_volume: f64,
    chamber_temperature: f64,
    molecular_weight: f64,
    outflow_coefficient: f64,
) -> f64 {
    let net_flow_rate = mass_flow_rate * (1.0 - outflow_coefficient);
    net_flow_rate * R_UNIVERSAL * chamber_temperature / (molecular_weight * chamber_volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrust_momentum_plus_pressure_terms() {
        // 1 kg/s at 2500 m/s, perfectly expanded: pure momentum thrust
        let f = thrust(1.0, 2500.0, 101_325.0, 101_325.0, 0.01);
        assert!((f - 2500.0).abs() < 1e-9);

        // Underexpanded exit adds pressure thrust
        let f = thrust(1.0, 2500.0, 201_325.0, 101_325.0, 0.01);
        assert!((f - 3500.0).abs() < 1e-9);
    }

    #[test]
    fn specific_impulse_of_known_thrust() {
        let isp = specific_impulse(2500.0, 1.0);
        assert!((isp - 2500.0 / G0_MPS2).abs() < 1e-9);
    }

    #[test]
    fn mass_flow_scales_linearly_with_chamber_pressure() {
        let at_2mpa = mass_flow_rate(2e6, 7.07e-4, 3100.0, 1.25, 0.026);
        let at_4mpa = mass_flow_rate(4e6, 7.07e-4, 3100.0, 1.25, 0.026);
        assert!((at_4mpa / at_2mpa - 2.0).abs() < 1e-9);
        assert!(at_2mpa > 0.0);
    }

    #[test]
    fn characteristic_velocity_plausible_for_methane_n2o() {
        let c_star = characteristic_velocity(3100.0, 1.25, 0.026);
        // Hydrocarbon engines sit in the 1500-2000 m/s range
        assert!(
            c_star > 1200.0 && c_star < 2500.0,
            "implausible c*: {c_star}"
        );
    }

    #[test]
    fn chamber_pressure_rate_zero_at_balanced_outflow() {
        let rate = chamber_pressure_rate(0.5, 0.001, 3000.0, 0.026, 1.0);
        assert_eq!(rate, 0.0);

        let rising = chamber_pressure_rate(0.5, 0.001, 3000.0, 0.026, 0.5);
        assert!(rising > 0.0);
    }
}
