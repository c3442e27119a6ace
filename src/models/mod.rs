// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AddressInfo, Book, BookRequest, BulkRequest, BulkStatus, Chat, ChatMessage, Coordinates,
    DistributionComment, DistributionEvent, Feedback, ImpactStats, PickupPoint, RankedBook,
    ReputationPolicy, ReputationSnapshot, RequestStatus, Role, User, VisibilityPolicy,
    NEUTRAL_REPUTATION,
};
pub use requests::{
    BlockUserRequest, CommentRequest, CreateBookRequest, CreateBulkRequest,
    CreateDistributionEvent, DonateBookRequest, FulfillBulkRequest, ListEventsQuery,
    PickupPointsQuery, RegisterRequest, ReverseGeocodeQuery, SearchBooksQuery,
    SendMessageRequest, SubmitFeedbackRequest, VerifyLocationQuery,
};
pub use responses::{
    BlockListResponse, CreatedResponse, ErrorResponse, FeedbackResponse, HealthResponse,
    LikeResponse, PickupPointsResponse, PublicProfile, UserLocation, VerifyLocationResponse,
};
