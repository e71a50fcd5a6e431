use rakorean_core::store::{CommentRecord, LikeRecord, PostRecord, ProfileRecord};
use supabase_client as client;

pub(crate) fn post_record(post: client::PostResult) -> PostRecord {
    PostRecord {
        id: post.id,
        owner_id: post.user_id,
        category: post.category,
        title: post.title,
        content: post.content,
        likes_count: post.likes_count,
        created_at: post.created_at,
    }
}

pub(crate) fn comment_record(comment: client::CommentResult) -> CommentRecord {
    CommentRecord {
        id: comment.id,
        post_id: comment.post_id,
        user_id: comment.user_id,
        content: comment.content,
        created_at: comment.created_at,
    }
}

pub(crate) fn like_record(like: client::LikeResult) -> LikeRecord {
    LikeRecord {
        post_id: like.post_id,
        user_id: like.user_id,
    }
}

pub(crate) fn profile_record(profile: client::ProfileResult) -> ProfileRecord {
    ProfileRecord {
        id: profile.id,
        display_name: profile.display_name,
        email: profile.email,
    }
}
