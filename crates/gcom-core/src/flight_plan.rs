//! Flight plan message sent to the competition organisers.

use crate::models::Route;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightPlanMessage {
    pub subject: String,
    pub body: String,
}

/// Format the plan as `<bidder>;<route number>;<route number>;...;`.
pub fn flight_plan_message(bidder: &str, routes: &[Route]) -> FlightPlanMessage {
    let mut body = format!("{};", bidder);
    for route in routes {
        body.push_str(&route.number.to_string());
        body.push(';');
    }

    FlightPlanMessage {
        subject: format!("{} Flight Plan", bidder),
        body,
    }
}
