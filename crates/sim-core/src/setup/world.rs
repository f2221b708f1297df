//! World Setup
//!
//! Creates the city map: the handful of places the characters move between.

use rust_decimal::Decimal;

use crate::components::world::{AccessRule, Location, LocationRegistry, LocationView, SecurityLevel};

/// Where agents created on first reference are placed.
pub const DEFAULT_LOCATION: &str = "street";

/// Create the world map with all locations
pub fn create_world_map() -> LocationRegistry {
    let mut registry = LocationRegistry::new();

    registry.add(
        Location::new("public_library", "Public Library")
            .with_resources(&["wifi", "power_outlets", "water_fountain"])
            .with_capacity(50)
            .with_security(SecurityLevel::High)
            .with_views(
                LocationView::new(
                    "Fluorescent lights flicker. Others guard the power outlets. A guard watches you.",
                    "tense_survival",
                    &[
                        "Worn carpet with stains",
                        "All comfortable chairs taken",
                        "Sign: \"2 hour computer limit\"",
                        "Other exhausted faces hunched over laptops",
                        "Security camera pointed at you",
                    ],
                ),
                LocationView::new(
                    "Quiet study space with natural light. Plenty of available seating.",
                    "productive_calm",
                    &[
                        "Clean, organized shelves",
                        "Available private study rooms",
                        "Friendly librarian offers help",
                        "New computers available",
                    ],
                ),
            ),
    );

    registry.add(
        Location::new("coffee_shop", "Coffee Shop")
            .with_resources(&["wifi", "coffee", "food"])
            .with_capacity(30)
            .with_entry_cost(Decimal::from(5))
            .with_security(SecurityLevel::Low)
            .with_views(
                LocationView::new(
                    "Steam burns your hands. Customers look through you.",
                    "exhausting_service",
                    &[
                        "Sticky floor you just mopped",
                        "Broken AC, sweat dripping",
                        "Manager watching from office",
                        "Line of impatient customers",
                        "$4 in tip jar, shared with 3 others",
                    ],
                ),
                LocationView::new(
                    "Artisanal coffee shop with exposed brick. Your usual table awaits.",
                    "comfortable_networking",
                    &[
                        "Barista knows your name and order",
                        "Other tech workers on laptops",
                        "Background jazz",
                        "Today's special: $18 adaptogenic latte",
                    ],
                ),
            ),
    );

    registry.add(
        Location::new("food_bank", "Food Bank")
            .with_resources(&["free_food"])
            .with_capacity(30)
            .with_security(SecurityLevel::Medium)
            .with_views(
                LocationView::new(
                    "Long line of tired faces. Smell of old vegetables.",
                    "desperate_shame",
                    &[
                        "45 minute wait",
                        "Everyone avoiding eye contact",
                        "Security guard by door",
                        "Sign: \"One bag per family\"",
                        "Expired bread, dented cans available",
                    ],
                ),
                LocationView::new(
                    "You are here for a photo op. The lighting is good.",
                    "performative_charity",
                    &[
                        "Volunteers excited to see you",
                        "A photographer captures your generosity",
                        "You will leave in 10 minutes",
                    ],
                ),
            ),
    );

    registry.add(
        Location::new("tech_office", "Tech Office")
            .with_resources(&["high_speed_internet", "free_food", "gym"])
            .with_capacity(200)
            .with_security(SecurityLevel::Medium)
            .with_access(AccessRule::EmployeesOnly)
            .with_views(
                LocationView::new(
                    "Glass doors you can't badge through. Snacks visible behind them.",
                    "locked_out",
                    &["Badge reader blinking red", "Catered lunch being cleared away"],
                ),
                LocationView::new(
                    "Open-plan office with free snacks and standing desks.",
                    "busy_comfort",
                    &["Kombucha on tap", "Standup in ten minutes", "Gym badge on your lanyard"],
                ),
            ),
    );

    registry.add(
        Location::new("hospital", "Hospital")
            .with_resources(&["vending_machines"])
            .with_capacity(500)
            .with_security(SecurityLevel::High)
            .with_views(
                LocationView::new(
                    "Beeping monitors and a waiting room full of people who can't afford to be here.",
                    "anxious_waiting",
                    &["Vending machine out of order", "Billing office sign", "Night shift nurses hurrying"],
                ),
                LocationView::new(
                    "Private wing with a concierge desk.",
                    "managed_care",
                    &["Fresh flowers", "Private room available"],
                ),
            ),
    );

    registry.add(
        Location::new("luxury_apartment", "Luxury Apartment")
            .with_resources(&["everything"])
            .with_capacity(5)
            .with_security(SecurityLevel::High)
            .with_access(AccessRule::ResidentsOnly)
            .with_views(
                LocationView::new(
                    "A doorman blocks the lobby and asks who you are here for.",
                    "unwelcome",
                    &["Marble lobby", "Doorman's stare"],
                ),
                LocationView::new(
                    "Penthouse with city views. Everything is quiet and clean.",
                    "serene_isolation",
                    &["Floor-to-ceiling windows", "Chef preparing dinner", "Pool on the roof"],
                ),
            ),
    );

    registry.add(
        Location::new("community_center", "Community Center")
            .with_resources(&["power_outlets", "free_food", "water_fountain"])
            .with_capacity(100)
            .with_views(
                LocationView::new(
                    "Folding chairs, a coffee urn, and flyers about the rent strike.",
                    "hopeful_organizing",
                    &["Rent strike sign-up sheet", "Childcare corner", "Free soup on Thursdays"],
                ),
                LocationView::new(
                    "A modest hall. People look up when you walk in.",
                    "curious_distance",
                    &["Flyers about the rent strike", "Donation box by the door"],
                ),
            ),
    );

    registry.add(
        Location::new(DEFAULT_LOCATION, "Street")
            .with_capacity(1000)
            .with_views(
                LocationView::new(
                    "Traffic noise and nowhere to sit.",
                    "exposed",
                    &["Bus shelter with a sloped bench", "Closed public restroom"],
                ),
                LocationView::new(
                    "City streets connecting everything you need.",
                    "in_transit",
                    &["Rideshare waiting", "Boutique storefronts"],
                ),
            ),
    );

    registry
}

/// Serialize the registry for inspection.
pub fn world_to_json(registry: &LocationRegistry) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(registry)
}
