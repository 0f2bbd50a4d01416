mod binding;
mod controller;
mod group;
mod validation;


pub use controller::{
    BoxedSubmitFuture, FieldKey, FormController, FormError, FormId, FormOptions, FormResult,
    FormSnapshot, FormValues, SubmitOutcome, SubmitRejection, SubmitResult, SubmitState,
    SubmitTask, SubscriptionId, ValueChange,
};
pub use binding::{DisplayValue, FieldBinding, FieldDecoration, FieldEvent, FieldKind};
pub use elektra_form_derive::FormModel;
pub use group::{FieldGroup, FieldGroupLayout, FieldGroupView};
pub use validation::{FormModel, FormValidator, RequiredFields, model_from_values, values_from_model};
