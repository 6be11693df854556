pub mod calc;
pub mod dates;
pub mod error;
pub mod id;
pub mod model;
pub mod phone;
pub mod search;
pub mod status;
pub mod validation;

pub use calc::{Quoted, calc_eta, calc_total, format_money};
pub use dates::{format_date, now_utc, parse_date};
pub use error::{CoreError, Result};
pub use id::{IdError, generate_id, validate_id};
pub use model::{
    LabTest, LabTestPatch, NewLabTest, NewOrder, NewOrderItem, NewPatient, Order, OrderDetail,
    OrderItem, OrderItemDetail, OrderRequest, OrderRequestItem, Patient, PatientPatch,
};
pub use phone::{format_phone_number, is_valid_phone_number};
pub use search::{DateRange, PatientQuery, SearchField};
pub use status::{InvalidTransition, OrderStatus};
pub use validation::{FieldError, ValidationErrors};
