pub mod comment;
pub mod playlist;
pub mod reaction;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::{Comment, CommentView, NewComment};
pub use playlist::{NewPlaylist, Playlist, PlaylistDetail, UpdatePlaylist};
pub use reaction::{ReactionKind, ReactionSummary, ReactionTarget};
pub use subscription::{ChannelCard, NewSubscription};
pub use tweet::{NewTweet, Tweet, TweetView};
pub use user::{ChannelProfile, NewUser, OwnerPublic, User};
pub use video::{NewVideo, UpdateVideo, Video, VideoDetail, VideoWithOwner};
