pub mod alert_definition;
pub mod alert_eval_state;
pub mod alert_instance;
pub mod alert_subscription;
pub mod equipment;
pub mod hours_exception;
pub mod notification;
pub mod profile;
pub mod sensor_entity;
pub mod setpoint_log;
pub mod site;
pub mod space;
pub mod store_hours;
pub mod zone;

pub use alert_definition::Entity as AlertDefinition;
pub use alert_eval_state::Entity as AlertEvalState;
pub use alert_instance::Entity as AlertInstance;
pub use alert_subscription::Entity as AlertSubscription;
pub use equipment::Entity as Equipment;
pub use hours_exception::Entity as HoursException;
pub use notification::Entity as Notification;
pub use profile::Entity as Profile;
pub use sensor_entity::Entity as SensorEntity;
pub use setpoint_log::Entity as SetpointLog;
pub use site::Entity as Site;
pub use space::Entity as Space;
pub use store_hours::Entity as StoreHours;
pub use zone::Entity as Zone;

pub mod prelude;
