table! {
    article_likes (id) {
        id -> Int4,
        article_id -> Int4,
        ip_address -> Varchar,
        created_at -> Timestamp,
    }
}

table! {
    articles (id) {
        id -> Int4,
        title -> Varchar,
        slug -> Varchar,
        content -> Text,
        excerpt -> Text,
        author -> Varchar,
        category_id -> Int4,
        published_at -> Nullable<Timestamp>,
        views -> Int4,
        likes -> Int4,
        image_url -> Nullable<Varchar>,
        sources -> Nullable<Array<Text>>,
        reading_time -> Nullable<Int4>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    categories (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        description -> Nullable<Text>,
        color -> Nullable<Varchar>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

joinable!(article_likes -> articles (article_id));
joinable!(articles -> categories (category_id));

allow_tables_to_appear_in_same_query!(article_likes, articles, categories,);
